// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end release pipeline tests.
//!
//! Tests cover:
//! - Merge precedence of the default bundle and policy output
//! - Case-insensitive name collisions
//! - Deny-all totality
//! - Pattern, static and chaining policies
//! - Principal id injection
//! - Fail-closed encryption
//! - Repeatable evaluation, including through a caching repository
//! - Consent narrowing

mod common;

use std::sync::Arc;

use common::{Fixture, JsonScriptExecutor};
use loom_attributes_core::{AttributeContainer, ConsentPolicy};
use loom_server_attributes::{
	AttributeDefinition, AttributeReleasePolicy, CachingPrincipalAttributesRepository,
	ChainingPolicy, EncryptingPolicy, InMemoryAttributeDefinitionStore, MergingStrategy,
	PatternPolicy, PatternRule, PolicyKind, ReleaseEngine, ReleaseServices, StaticPolicy,
};
use proptest::prelude::*;
use serde_json::json;

fn static_policy(entries: &[(&str, Vec<serde_json::Value>)]) -> AttributeReleasePolicy {
	let policy = entries
		.iter()
		.fold(StaticPolicy::new(), |policy, (name, values)| {
			policy.with_values(*name, values.clone())
		});
	AttributeReleasePolicy::new(PolicyKind::Static(policy))
}

async fn release(engine: &ReleaseEngine, policy: &AttributeReleasePolicy, fixture: &Fixture) -> AttributeContainer {
	engine
		.release(policy, &fixture.principal, &fixture.service, &fixture.registered)
		.await
}

#[tokio::test]
async fn policy_output_wins_over_default_bundle() {
	let fixture = Fixture::new();
	let engine = ReleaseEngine::new(
		ReleaseServices::new().with_default_attributes(vec!["mail".to_string()]),
	);
	let policy = static_policy(&[
		("mail", vec![json!("b@x.com")]),
		("dept", vec![json!("eng")]),
	]);

	let released = release(&engine, &policy, &fixture).await;

	let expected: AttributeContainer = vec![
		("mail", vec![json!("b@x.com")]),
		("dept", vec![json!("eng")]),
	]
	.into_iter()
	.collect();
	assert_eq!(released, expected);
}

#[tokio::test]
async fn colliding_names_collapse_and_last_write_wins() {
	let fixture = Fixture::new();
	let engine = ReleaseEngine::default();
	let chain = ChainingPolicy::new()
		.with_policy(static_policy(&[("Mail", vec![json!("first@x.com")])]))
		.with_policy(static_policy(&[("mail", vec![json!("second@x.com")])]));
	let policy = AttributeReleasePolicy::new(PolicyKind::Chaining(chain));

	let released = release(&engine, &policy, &fixture).await;

	assert_eq!(released.len(), 1);
	assert_eq!(released.names().collect::<Vec<_>>(), vec!["mail"]);
	assert_eq!(released.get("MAIL"), Some(&[json!("second@x.com")][..]));
}

#[tokio::test]
async fn deny_all_releases_nothing_even_with_principal_id_attribute() {
	let fixture = Fixture::new().with_username("jdoe");
	let engine = ReleaseEngine::new(
		ReleaseServices::new().with_default_attributes(vec!["mail".to_string(), "cn".to_string()]),
	);
	let policy = AttributeReleasePolicy::deny_all().with_principal_id_attribute("username");

	assert!(release(&engine, &policy, &fixture).await.is_empty());
}

#[tokio::test]
async fn pattern_rewrites_with_capture_groups() {
	let fixture = Fixture::new();
	let policy = AttributeReleasePolicy::new(PolicyKind::Pattern(
		PatternPolicy::new().with_rule("uid", PatternRule::new(r"([a-z]+)(\d+)", "user-${1}")),
	));

	let released = release(&ReleaseEngine::default(), &policy, &fixture).await;
	assert_eq!(released.get("uid"), Some(&[json!("user-jdoe")][..]));
}

#[tokio::test]
async fn static_values_pass_through_unchanged() {
	let fixture = Fixture::new();
	let policy = static_policy(&[("role", vec![json!("admin")])]);

	let released = release(&ReleaseEngine::default(), &policy, &fixture).await;

	let expected: AttributeContainer = vec![("role", vec![json!("admin")])].into_iter().collect();
	assert_eq!(released, expected);
}

#[tokio::test]
async fn chaining_later_members_win() {
	let fixture = Fixture::new();
	let chain = ChainingPolicy::new()
		.with_policy(static_policy(&[("a", vec![json!(1)])]))
		.with_policy(static_policy(&[("a", vec![json!(2)]), ("b", vec![json!(3)])]));
	let policy = AttributeReleasePolicy::new(PolicyKind::Chaining(chain));

	let released = release(&ReleaseEngine::default(), &policy, &fixture).await;

	let expected: AttributeContainer = vec![("a", vec![json!(2)]), ("b", vec![json!(3)])]
		.into_iter()
		.collect();
	assert_eq!(released, expected);
}

#[tokio::test]
async fn chaining_merging_strategies() {
	let fixture = Fixture::new();
	let members = || {
		ChainingPolicy::new()
			.with_policy(static_policy(&[("a", vec![json!(1)])]))
			.with_policy(static_policy(&[("a", vec![json!(1), json!(2)])]))
	};

	let add = AttributeReleasePolicy::new(PolicyKind::Chaining(
		members().with_merging_strategy(MergingStrategy::Add),
	));
	let released = release(&ReleaseEngine::default(), &add, &fixture).await;
	assert_eq!(released.get("a"), Some(&[json!(1)][..]));

	let multivalued = AttributeReleasePolicy::new(PolicyKind::Chaining(
		members().with_merging_strategy(MergingStrategy::Multivalued),
	));
	let released = release(&ReleaseEngine::default(), &multivalued, &fixture).await;
	assert_eq!(released.get("a"), Some(&[json!(1), json!(2)][..]));
}

#[tokio::test]
async fn failing_member_does_not_poison_the_chain() {
	let fixture = Fixture::new();
	let chain = ChainingPolicy::new()
		.with_policy(AttributeReleasePolicy::new(PolicyKind::Encrypting(
			EncryptingPolicy::new(["mail"]),
		)))
		.with_policy(AttributeReleasePolicy::allowed(["cn"]));
	let policy = AttributeReleasePolicy::new(PolicyKind::Chaining(chain));

	let released = release(&ReleaseEngine::default(), &policy, &fixture).await;
	assert_eq!(released.names().collect::<Vec<_>>(), vec!["cn"]);
}

#[tokio::test]
async fn principal_id_overrides_policy_output() {
	let fixture = Fixture::new().with_username("jdoe");
	let policy =
		static_policy(&[("username", vec![json!("wrong")])]).with_principal_id_attribute("username");

	let released = release(&ReleaseEngine::default(), &policy, &fixture).await;
	assert_eq!(released.get("username"), Some(&[json!("jdoe")][..]));
}

#[tokio::test]
async fn principal_id_needs_a_username_provider() {
	let fixture = Fixture::new();
	let policy =
		static_policy(&[("username", vec![json!("kept")])]).with_principal_id_attribute("username");

	let released = release(&ReleaseEngine::default(), &policy, &fixture).await;
	assert_eq!(released.get("username"), Some(&[json!("kept")][..]));
}

#[tokio::test]
async fn encryption_without_public_key_releases_nothing() {
	let fixture = Fixture::new();
	let engine = ReleaseEngine::new(
		ReleaseServices::new().with_default_attributes(vec!["cn".to_string()]),
	);
	let policy = AttributeReleasePolicy::new(PolicyKind::Encrypting(EncryptingPolicy::new([
		"mail", "cn", "uid",
	])));

	assert!(release(&engine, &policy, &fixture).await.is_empty());
}

#[tokio::test]
async fn repeated_evaluation_is_identical() {
	let fixture = Fixture::new().with_username("jdoe");
	let engine = ReleaseEngine::new(
		ReleaseServices::new()
			.with_default_attributes(vec!["dept".to_string(), "cn".to_string()])
			.with_script_executor(Arc::new(JsonScriptExecutor)),
	);
	let policy = AttributeReleasePolicy::allowed([
		"mail",
		"uid",
		r#"script { {"role": ["a", "b"], "Mail": "override@x.com"} }"#,
	])
	.with_principal_id_attribute("principal");

	let first = release(&engine, &policy, &fixture).await;
	let second = release(&engine, &policy, &fixture).await;

	assert_eq!(first, second);
	assert_eq!(
		first.names().collect::<Vec<_>>(),
		second.names().collect::<Vec<_>>()
	);
	assert_eq!(first.get("mail"), Some(&[json!("override@x.com")][..]));
}

#[tokio::test]
async fn cached_attributes_are_resolved_once_per_release() {
	let fixture = Fixture::new();
	let store = InMemoryAttributeDefinitionStore::new()
		.with_definition(AttributeDefinition::new("mail").with_pattern_format("mailto:{0}"));
	let engine = ReleaseEngine::new(ReleaseServices::new().with_definition_store(Arc::new(store)));
	let repository = Arc::new(CachingPrincipalAttributesRepository::new(
		chrono::Duration::minutes(5),
	));
	let policy = AttributeReleasePolicy::allowed(["mail"]).with_repository(repository.clone());

	let mut releases = Vec::new();
	for _ in 0..3 {
		releases.push(release(&engine, &policy, &fixture).await);
	}

	for released in &releases {
		assert_eq!(released.get("mail"), Some(&[json!("mailto:a@x.com")][..]));
	}
	assert_eq!(
		repository
			.resolved("jdoe", &fixture.registered)
			.await
			.and_then(|resolved| resolved.get("mail").map(<[_]>::to_vec)),
		Some(vec![json!("mailto:a@x.com")])
	);
}

#[tokio::test]
async fn consent_view_narrows_without_changing_release() {
	let mut fixture = Fixture::new();
	fixture.registered = fixture.registered.with_consent_policy(
		ConsentPolicy::new()
			.excluding(["dept"])
			.including_only(["mail", "dept", "uid"]),
	);
	let engine = ReleaseEngine::default();
	let policy = AttributeReleasePolicy::return_all();

	let consentable = engine
		.consentable_attributes(&policy, &fixture.principal, &fixture.service, &fixture.registered)
		.await;
	let released = release(&engine, &policy, &fixture).await;

	assert_eq!(consentable.names().collect::<Vec<_>>(), vec!["uid", "mail"]);
	assert_eq!(released.len(), 4);
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(32))]

	#[test]
	fn deny_all_is_total(
		attributes in prop::collection::vec(("[a-zA-Z]{1,8}", "[a-z0-9]{0,8}"), 0..8),
		principal_id_attribute in prop::option::of("[a-z]{1,8}"),
		defaults in prop::collection::vec("[a-zA-Z]{1,8}", 0..4),
	) {
		let mut fixture = Fixture::new().with_username("jdoe");
		fixture.principal.attributes = attributes
			.into_iter()
			.map(|(name, value)| (name, vec![json!(value)]))
			.collect();

		let mut policy = AttributeReleasePolicy::deny_all();
		if let Some(attribute) = principal_id_attribute {
			policy = policy.with_principal_id_attribute(attribute);
		}
		let engine = ReleaseEngine::new(ReleaseServices::new().with_default_attributes(defaults));

		let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
		let released = runtime.block_on(release(&engine, &policy, &fixture));
		prop_assert!(released.is_empty());
	}
}

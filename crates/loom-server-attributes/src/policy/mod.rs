// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute release policies.
//!
//! A policy is a [`PolicyKind`] (what to release) plus [`ReleaseSettings`]
//! (how the shared pipeline treats it). Every kind except
//! [`PolicyKind::DenyAll`] and [`PolicyKind::Chaining`] runs through the same
//! pipeline in [`crate::pipeline`]; those two are described by their
//! [`KindBehavior`] entry and handled before the pipeline starts.

mod allowed;
mod chaining;
mod encrypting;
mod environment;
mod mapped;
mod pattern;
mod restful;
mod return_all;
mod scripted;
mod static_values;

pub use allowed::AllowedPolicy;
pub use chaining::{ChainingPolicy, MergingStrategy};
pub use encrypting::EncryptingPolicy;
pub use environment::{EnvironmentPolicy, APPLICATION_PROFILES_ATTRIBUTE};
pub use mapped::{LinkedPolicy, MappedPolicy, MappedTargets};
pub use pattern::{PatternPolicy, PatternRule};
pub use restful::{HttpMethod, RestfulPolicy};
pub use return_all::ReturnAllPolicy;
pub use scripted::ScriptedPolicy;
pub use static_values::StaticPolicy;

use std::fmt;
use std::sync::Arc;

use loom_attributes_core::{AttributeContainer, ReleaseContext};
use serde::{Deserialize, Serialize};

use crate::activation::ActivationCriteria;
use crate::canonicalization::CanonicalizationMode;
use crate::error::Result;
use crate::filter::AttributeFilterConfig;
use crate::pipeline::ReleaseEngine;
use crate::repository::PrincipalAttributesRepository;

/// A configured attribute release policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeReleasePolicy {
	#[serde(default)]
	pub settings: ReleaseSettings,
	#[serde(flatten)]
	pub kind: PolicyKind,
}

impl AttributeReleasePolicy {
	pub fn new(kind: PolicyKind) -> Self {
		Self {
			settings: ReleaseSettings::default(),
			kind,
		}
	}

	pub fn deny_all() -> Self {
		Self::new(PolicyKind::DenyAll)
	}

	pub fn return_all() -> Self {
		Self::new(PolicyKind::ReturnAll(ReturnAllPolicy::default()))
	}

	pub fn allowed<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(PolicyKind::Allowed(AllowedPolicy::new(names)))
	}

	pub fn with_settings(mut self, settings: ReleaseSettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn with_principal_id_attribute(mut self, attribute: impl Into<String>) -> Self {
		self.settings.principal_id_attribute = Some(attribute.into());
		self
	}

	/// Whether the default bundle is left out of this policy's release.
	pub fn exclude_default_attributes(&self) -> bool {
		self.settings.exclude_default_attributes || self.kind.behavior().excludes_default_attributes
	}

	pub fn excluding_default_attributes(mut self) -> Self {
		self.settings.exclude_default_attributes = true;
		self
	}

	pub fn with_repository(mut self, repository: Arc<dyn PrincipalAttributesRepository>) -> Self {
		self.settings.principal_attributes_repository = Some(repository);
		self
	}

	pub fn with_attribute_filter(mut self, filter: AttributeFilterConfig) -> Self {
		self.settings.attribute_filter = Some(filter);
		self
	}

	pub fn with_activation(mut self, criteria: ActivationCriteria) -> Self {
		self.settings.activation = Some(criteria);
		self
	}

	pub fn with_canonicalization(mut self, mode: CanonicalizationMode) -> Self {
		self.settings.canonicalization = mode;
		self
	}

	/// Whether this policy applies to the request at all.
	pub fn supports(&self, context: &ReleaseContext<'_>) -> bool {
		self
			.settings
			.activation
			.as_ref()
			.map_or(true, |criteria| criteria.is_satisfied(context.principal))
	}

	/// Attribute definition keys the policy needs resolved before computing.
	pub fn requested_definitions(&self) -> Vec<String> {
		self.kind.requested_definitions()
	}

	pub fn authorized_to_release_credential_password(&self) -> bool {
		self.release_flag(|settings| settings.authorized_to_release_credential_password, |p| {
			p.authorized_to_release_credential_password()
		})
	}

	pub fn authorized_to_release_proxy_granting_ticket(&self) -> bool {
		self.release_flag(|settings| settings.authorized_to_release_proxy_granting_ticket, |p| {
			p.authorized_to_release_proxy_granting_ticket()
		})
	}

	pub fn authorized_to_release_authentication_attributes(&self) -> bool {
		self.release_flag(
			|settings| settings.authorized_to_release_authentication_attributes,
			|p| p.authorized_to_release_authentication_attributes(),
		)
	}

	fn release_flag(
		&self,
		configured: impl Fn(&ReleaseSettings) -> bool,
		member: impl Fn(&AttributeReleasePolicy) -> bool,
	) -> bool {
		let behavior = self.kind.behavior();
		if behavior.releases_nothing {
			return false;
		}
		match &self.kind {
			PolicyKind::Chaining(chain) if behavior.composite => chain.policies.iter().any(member),
			_ => configured(&self.settings),
		}
	}
}

/// Settings the shared pipeline applies around every policy kind.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseSettings {
	/// Attribute the resolved username is written under, overriding any
	/// released value of the same name.
	pub principal_id_attribute: Option<String>,
	pub exclude_default_attributes: bool,
	pub authorized_to_release_credential_password: bool,
	pub authorized_to_release_proxy_granting_ticket: bool,
	pub authorized_to_release_authentication_attributes: bool,
	pub canonicalization: CanonicalizationMode,
	pub activation: Option<ActivationCriteria>,
	pub attribute_filter: Option<AttributeFilterConfig>,
	#[serde(skip)]
	pub principal_attributes_repository: Option<Arc<dyn PrincipalAttributesRepository>>,
}

impl Default for ReleaseSettings {
	fn default() -> Self {
		Self {
			principal_id_attribute: None,
			exclude_default_attributes: false,
			authorized_to_release_credential_password: false,
			authorized_to_release_proxy_granting_ticket: false,
			authorized_to_release_authentication_attributes: true,
			canonicalization: CanonicalizationMode::None,
			activation: None,
			attribute_filter: None,
			principal_attributes_repository: None,
		}
	}
}

impl fmt::Debug for ReleaseSettings {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReleaseSettings")
			.field("principal_id_attribute", &self.principal_id_attribute)
			.field("exclude_default_attributes", &self.exclude_default_attributes)
			.field(
				"authorized_to_release_credential_password",
				&self.authorized_to_release_credential_password,
			)
			.field(
				"authorized_to_release_proxy_granting_ticket",
				&self.authorized_to_release_proxy_granting_ticket,
			)
			.field(
				"authorized_to_release_authentication_attributes",
				&self.authorized_to_release_authentication_attributes,
			)
			.field("canonicalization", &self.canonicalization)
			.field("activation", &self.activation)
			.field("attribute_filter", &self.attribute_filter)
			.field(
				"principal_attributes_repository",
				&self.principal_attributes_repository.is_some(),
			)
			.finish()
	}
}

/// How the pipeline treats a policy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindBehavior {
	/// Releases nothing and skips every pipeline step. Release flags are
	/// always false.
	pub releases_nothing: bool,
	/// Evaluates member policies through the pipeline instead of running it
	/// once. Release flags are the union of the members' flags.
	pub composite: bool,
	/// Never merges the default bundle, whatever the settings say.
	pub excludes_default_attributes: bool,
	/// Released values are ciphertext; value canonicalization must not touch
	/// them.
	pub opaque_values: bool,
}

impl KindBehavior {
	const PIPELINE: Self = Self {
		releases_nothing: false,
		composite: false,
		excludes_default_attributes: false,
		opaque_values: false,
	};
	const DENY: Self = Self {
		releases_nothing: true,
		composite: false,
		excludes_default_attributes: true,
		opaque_values: false,
	};
	const COMPOSITE: Self = Self {
		releases_nothing: false,
		composite: true,
		excludes_default_attributes: false,
		opaque_values: false,
	};
	const ENCRYPTED: Self = Self {
		releases_nothing: false,
		composite: false,
		excludes_default_attributes: true,
		opaque_values: true,
	};
}

/// What a policy releases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyKind {
	DenyAll,
	ReturnAll(ReturnAllPolicy),
	Allowed(AllowedPolicy),
	Mapped(MappedPolicy),
	Linked(LinkedPolicy),
	Static(StaticPolicy),
	Pattern(PatternPolicy),
	Restful(RestfulPolicy),
	Encrypting(EncryptingPolicy),
	Environment(EnvironmentPolicy),
	Scripted(ScriptedPolicy),
	Chaining(ChainingPolicy),
}

impl PolicyKind {
	pub fn behavior(&self) -> KindBehavior {
		match self {
			Self::DenyAll => KindBehavior::DENY,
			Self::Chaining(_) => KindBehavior::COMPOSITE,
			Self::Encrypting(_) => KindBehavior::ENCRYPTED,
			_ => KindBehavior::PIPELINE,
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Self::DenyAll => "deny_all",
			Self::ReturnAll(_) => "return_all",
			Self::Allowed(_) => "allowed",
			Self::Mapped(_) => "mapped",
			Self::Linked(_) => "linked",
			Self::Static(_) => "static",
			Self::Pattern(_) => "pattern",
			Self::Restful(_) => "restful",
			Self::Encrypting(_) => "encrypting",
			Self::Environment(_) => "environment",
			Self::Scripted(_) => "scripted",
			Self::Chaining(_) => "chaining",
		}
	}

	pub fn requested_definitions(&self) -> Vec<String> {
		match self {
			Self::Allowed(policy) => policy.requested_definitions(),
			Self::Encrypting(policy) => policy.requested_definitions(),
			Self::Mapped(policy) => policy.requested_definitions(),
			Self::Linked(policy) => policy.requested_definitions(),
			Self::Pattern(policy) => policy.requested_definitions(),
			_ => Vec::new(),
		}
	}

	/// Computes what this kind releases from the resolved attributes.
	pub async fn compute(
		&self,
		engine: &ReleaseEngine,
		context: &ReleaseContext<'_>,
		resolved: &AttributeContainer,
	) -> Result<AttributeContainer> {
		let services = engine.services();
		match self {
			Self::DenyAll => Ok(AttributeContainer::new()),
			Self::ReturnAll(policy) => Ok(policy.compute(resolved)),
			Self::Allowed(policy) => policy.compute(services, context, resolved).await,
			Self::Mapped(policy) => policy.compute(services, resolved).await,
			Self::Linked(policy) => policy.compute(services, resolved).await,
			Self::Static(policy) => Ok(policy.compute(services)),
			Self::Pattern(policy) => policy.compute(resolved),
			Self::Restful(policy) => policy.compute(services, context, resolved).await,
			Self::Encrypting(policy) => policy.compute(services, context, resolved).await,
			Self::Environment(policy) => Ok(policy.compute(services)),
			Self::Scripted(policy) => policy.compute(services, context, resolved).await,
			Self::Chaining(policy) => Ok(policy.release(engine, context).await),
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The release pipeline.
//!
//! [`ReleaseEngine::release`] evaluates a policy for one request:
//!
//! 1. Skip entirely for kinds that release nothing
//! 2. Check the policy's activation criteria, then hand composite kinds
//!    their members
//! 3. Acquire principal attributes, from the policy's repository if it has one
//! 4. Seed requested definitions and resolve them through the definition store
//! 5. Refresh the repository with the resolved attributes
//! 6. Compute the policy kind's release
//! 7. Merge the default bundle first, then the policy release over it
//! 8. Write the resolved username under the principal id attribute
//! 9. Canonicalize values unless the kind releases ciphertext, then run the
//!    attribute filter
//!
//! Any error in steps 3 to 8 is logged and the release is empty.

use std::sync::Arc;

use futures::future::BoxFuture;
use loom_attributes_core::{AttributeContainer, Principal, RegisteredService, ReleaseContext, Service};
use serde_json::Value;
use tracing::{debug, instrument, trace, warn, Instrument};

use crate::cipher::{PublicKeyCipher, RsaCipher};
use crate::client;
use crate::config::ReleaseConfig;
use crate::consent;
use crate::definitions::AttributeDefinitionStore;
use crate::error::Result;
use crate::expression::ExpressionResolver;
use crate::filter::AttributeFilter;
use crate::policy::{AttributeReleasePolicy, PolicyKind};
use crate::script::ScriptExecutor;

/// Collaborators and global settings shared by every release.
#[derive(Clone)]
pub struct ReleaseServices {
	definition_store: Option<Arc<dyn AttributeDefinitionStore>>,
	script_executor: Option<Arc<dyn ScriptExecutor>>,
	cipher: Arc<dyn PublicKeyCipher>,
	http_client: reqwest::Client,
	expression_resolver: ExpressionResolver,
	default_attributes: Vec<String>,
	active_profiles: Vec<String>,
}

impl ReleaseServices {
	pub fn new() -> Self {
		Self {
			definition_store: None,
			script_executor: None,
			cipher: Arc::new(RsaCipher),
			http_client: reqwest::Client::new(),
			expression_resolver: ExpressionResolver::new(),
			default_attributes: Vec::new(),
			active_profiles: Vec::new(),
		}
	}

	/// Builds services from resolved configuration.
	pub fn from_config(config: &ReleaseConfig) -> Result<Self> {
		Ok(Self::new()
			.with_http_client(client::new_client(config)?)
			.with_expression_resolver(
				ExpressionResolver::new().with_system_properties(config.system_properties.clone()),
			)
			.with_default_attributes(config.default_attributes.clone())
			.with_active_profiles(config.active_profiles.clone()))
	}

	pub fn with_definition_store(mut self, store: Arc<dyn AttributeDefinitionStore>) -> Self {
		self.definition_store = Some(store);
		self
	}

	pub fn with_script_executor(mut self, executor: Arc<dyn ScriptExecutor>) -> Self {
		self.script_executor = Some(executor);
		self
	}

	pub fn with_cipher(mut self, cipher: Arc<dyn PublicKeyCipher>) -> Self {
		self.cipher = cipher;
		self
	}

	pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
		self.http_client = client;
		self
	}

	pub fn with_expression_resolver(mut self, resolver: ExpressionResolver) -> Self {
		self.expression_resolver = resolver;
		self
	}

	pub fn with_default_attributes(mut self, names: Vec<String>) -> Self {
		self.default_attributes = names;
		self
	}

	pub fn with_active_profiles(mut self, profiles: Vec<String>) -> Self {
		self.active_profiles = profiles;
		self
	}

	pub fn definition_store(&self) -> Option<&dyn AttributeDefinitionStore> {
		self.definition_store.as_deref()
	}

	pub fn script_executor(&self) -> Option<&dyn ScriptExecutor> {
		self.script_executor.as_deref()
	}

	pub fn cipher(&self) -> &dyn PublicKeyCipher {
		self.cipher.as_ref()
	}

	pub fn http_client(&self) -> &reqwest::Client {
		&self.http_client
	}

	pub fn expression_resolver(&self) -> &ExpressionResolver {
		&self.expression_resolver
	}

	pub fn default_attributes(&self) -> &[String] {
		&self.default_attributes
	}

	pub fn active_profiles(&self) -> &[String] {
		&self.active_profiles
	}

	/// The configured default attributes present in `resolved`.
	fn default_bundle(&self, resolved: &AttributeContainer) -> AttributeContainer {
		let mut bundle = AttributeContainer::new();
		for name in &self.default_attributes {
			if let (Some(stored), Some(values)) = (resolved.stored_name(name), resolved.get(name)) {
				bundle.insert(stored, values.to_vec());
			}
		}
		bundle
	}
}

impl Default for ReleaseServices {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for ReleaseServices {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ReleaseServices")
			.field("definition_store", &self.definition_store.is_some())
			.field("script_executor", &self.script_executor.is_some())
			.field("expression_resolver", &self.expression_resolver)
			.field("default_attributes", &self.default_attributes)
			.field("active_profiles", &self.active_profiles)
			.finish_non_exhaustive()
	}
}

/// Evaluates attribute release policies.
#[derive(Debug, Clone, Default)]
pub struct ReleaseEngine {
	services: ReleaseServices,
}

impl ReleaseEngine {
	pub fn new(services: ReleaseServices) -> Self {
		Self { services }
	}

	pub fn services(&self) -> &ReleaseServices {
		&self.services
	}

	/// Computes the attributes `policy` releases to `service`.
	///
	/// Never fails: errors are logged and release nothing.
	pub fn release<'a>(
		&'a self,
		policy: &'a AttributeReleasePolicy,
		principal: &'a Principal,
		service: &'a Service,
		registered_service: &'a RegisteredService,
	) -> BoxFuture<'a, AttributeContainer> {
		let span = tracing::debug_span!(
			"attribute_release",
			policy = policy.kind.name(),
			principal_id = %principal.id,
			registered_service = registered_service.id,
		);

		Box::pin(
			async move {
				let context = ReleaseContext::new(principal, service, registered_service);
				let behavior = policy.kind.behavior();

				if behavior.releases_nothing {
					debug!("policy releases nothing");
					return AttributeContainer::new();
				}

				if !policy.supports(&context) {
					debug!("policy does not apply to this request");
					return AttributeContainer::new();
				}

				if let PolicyKind::Chaining(chain) = &policy.kind {
					return chain.release(self, &context).await;
				}

				match self.run_pipeline(policy, &context).await {
					Ok(released) => {
						debug!(released = released.len(), "attributes released");
						released
					}
					Err(error) => {
						warn!(
							%error,
							policy = policy.kind.name(),
							registered_service = registered_service.id,
							"attribute release failed; releasing nothing"
						);
						AttributeContainer::new()
					}
				}
			}
			.instrument(span),
		)
	}

	/// The released attributes narrowed by the registered service's consent
	/// policy, for presenting a consent prompt.
	#[instrument(skip_all, fields(principal_id = %principal.id, registered_service = registered_service.id))]
	pub async fn consentable_attributes(
		&self,
		policy: &AttributeReleasePolicy,
		principal: &Principal,
		service: &Service,
		registered_service: &RegisteredService,
	) -> AttributeContainer {
		let released = self
			.release(policy, principal, service, registered_service)
			.await;
		consent::narrow(released, registered_service.consent_policy.as_ref())
	}

	async fn run_pipeline(
		&self,
		policy: &AttributeReleasePolicy,
		context: &ReleaseContext<'_>,
	) -> Result<AttributeContainer> {
		let settings = &policy.settings;
		let principal = context.principal;
		let registered_service = context.registered_service;

		let raw = match &settings.principal_attributes_repository {
			Some(repository) => repository.attributes(principal, registered_service).await?,
			None => principal.attributes.clone(),
		};

		let resolved = self
			.resolve_definitions(policy.requested_definitions(), raw, context)
			.await?;

		if let Some(repository) = &settings.principal_attributes_repository {
			if let Err(error) = repository
				.update(&principal.id, &resolved, registered_service)
				.await
			{
				warn!(%error, "failed to refresh principal attributes");
			}
		}

		let computed = policy.kind.compute(self, context, &resolved).await?;

		let mut released = if policy.exclude_default_attributes() {
			AttributeContainer::new()
		} else {
			self.services.default_bundle(&resolved)
		};
		released.merge(computed);

		if let (Some(attribute), Some(provider)) = (
			&settings.principal_id_attribute,
			&registered_service.username_attribute_provider,
		) {
			let username = provider.resolve_username(principal, context.service, registered_service);
			debug!(attribute = %attribute, "releasing principal id");
			released.insert(attribute.as_str(), vec![Value::String(username)]);
		}

		if policy.kind.behavior().opaque_values {
			trace!("values are opaque; canonicalization skipped");
		} else {
			settings.canonicalization.apply(&mut released);
		}

		Ok(match &settings.attribute_filter {
			Some(filter) => apply_filter(filter, released),
			None => released,
		})
	}

	async fn resolve_definitions(
		&self,
		requested: Vec<String>,
		raw: AttributeContainer,
		context: &ReleaseContext<'_>,
	) -> Result<AttributeContainer> {
		let Some(store) = self.services.definition_store() else {
			return Ok(raw);
		};
		if store.is_empty() {
			return Ok(raw);
		}

		let mut seeded = raw;
		for name in requested {
			if !seeded.contains(&name) {
				seeded.insert(name, Vec::new());
			}
		}
		store.resolve(seeded, context).await
	}
}

fn apply_filter(filter: &dyn AttributeFilter, released: AttributeContainer) -> AttributeContainer {
	filter.filter(released)
}

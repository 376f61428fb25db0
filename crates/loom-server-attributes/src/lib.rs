// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute release policy engine for Loom.
//!
//! Given an authenticated principal and the service it is signing on to, the
//! engine decides which attributes are disclosed, under what names and in what
//! form. Policies are plain serde values ([`AttributeReleasePolicy`]);
//! collaborators such as the attribute definition store, script runtime and
//! cipher are injected through [`ReleaseServices`].
//!
//! Releases fail closed: an error anywhere in a policy's evaluation is logged
//! and nothing is released for that policy.
//!
//! # Example
//!
//! ```
//! use loom_attributes_core::{Principal, RegisteredService, Service};
//! use loom_server_attributes::{AttributeReleasePolicy, ReleaseEngine, ReleaseServices};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let engine = ReleaseEngine::new(ReleaseServices::new());
//! let policy = AttributeReleasePolicy::allowed(["mail"]);
//! let principal = Principal::new("jdoe")
//!     .with_attribute("mail", vec![json!("jdoe@example.com")])
//!     .with_attribute("ssn", vec![json!("123-45-6789")]);
//! let service = Service::new("https://app.example.com");
//! let registered = RegisteredService::new(1, "app", "https://app.example.com/.*");
//!
//! let released = engine.release(&policy, &principal, &service, &registered).await;
//! assert!(released.contains("mail"));
//! assert!(!released.contains("ssn"));
//! # }
//! ```

pub mod activation;
pub mod canonicalization;
pub mod cipher;
pub mod client;
pub mod config;
pub mod consent;
pub mod definitions;
pub mod error;
pub mod expression;
pub mod filter;
pub mod pipeline;
pub mod policy;
pub mod repository;
pub mod script;
pub mod username;

#[cfg(test)]
pub(crate) mod test_support;

pub use activation::{ActivationCriteria, LogicalOperator};
pub use canonicalization::CanonicalizationMode;
pub use cipher::{load_public_key, PublicKeyCipher, RsaCipher};
pub use config::{load_config, load_config_with_file, ConfigError, ReleaseConfig, ReleaseConfigLayer};
pub use definitions::{AttributeDefinition, AttributeDefinitionStore, InMemoryAttributeDefinitionStore};
pub use error::{ReleaseError, Result};
pub use expression::ExpressionResolver;
pub use filter::{AttributeFilter, AttributeFilterConfig};
pub use pipeline::{ReleaseEngine, ReleaseServices};
pub use policy::{
	AllowedPolicy, AttributeReleasePolicy, ChainingPolicy, EncryptingPolicy, EnvironmentPolicy,
	HttpMethod, KindBehavior, LinkedPolicy, MappedPolicy, MappedTargets, MergingStrategy,
	PatternPolicy, PatternRule, PolicyKind, ReleaseSettings, RestfulPolicy, ReturnAllPolicy,
	ScriptedPolicy, StaticPolicy, APPLICATION_PROFILES_ATTRIBUTE,
};
pub use repository::{CachingPrincipalAttributesRepository, PrincipalAttributesRepository};
pub use script::{ScriptBindings, ScriptExecutor, ScriptReference};
pub use username::{
	AnonymousUsernameProvider, DefaultUsernameProvider, PrincipalAttributeUsernameProvider,
};

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use indexmap::IndexMap;
use loom_attributes_core::AttributeContainer;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::pipeline::ReleaseServices;

/// Attribute the active profiles are released under.
pub const APPLICATION_PROFILES_ATTRIBUTE: &str = "applicationProfiles";

/// Releases values from the server's environment instead of the principal.
///
/// `environment_variables` and `system_properties` map a lookup name to the
/// attribute it is released under. Unset lookups are skipped. Active profiles,
/// when any are configured, are released under
/// [`APPLICATION_PROFILES_ATTRIBUTE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentPolicy {
	#[serde(default)]
	pub environment_variables: IndexMap<String, String>,
	#[serde(default)]
	pub system_properties: IndexMap<String, String>,
}

impl EnvironmentPolicy {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_environment_variable(mut self, variable: impl Into<String>, name: impl Into<String>) -> Self {
		self.environment_variables.insert(variable.into(), name.into());
		self
	}

	pub fn with_system_property(mut self, property: impl Into<String>, name: impl Into<String>) -> Self {
		self.system_properties.insert(property.into(), name.into());
		self
	}

	pub(crate) fn compute(&self, services: &ReleaseServices) -> AttributeContainer {
		let mut released = AttributeContainer::new();

		for (variable, name) in &self.environment_variables {
			match std::env::var(variable) {
				Ok(value) => released.insert_value(name.as_str(), value),
				Err(_) => trace!(variable = %variable, "environment variable not set"),
			}
		}

		for (property, name) in &self.system_properties {
			match services.expression_resolver().system_property(property) {
				Some(value) => released.insert_value(name.as_str(), value),
				None => trace!(property = %property, "system property not set"),
			}
		}

		let profiles = services.active_profiles();
		if !profiles.is_empty() {
			released.insert(
				APPLICATION_PROFILES_ATTRIBUTE,
				profiles.iter().cloned().map(Into::into).collect(),
			);
		}

		released
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expression::ExpressionResolver;
	use serde_json::json;

	#[test]
	fn releases_environment_and_properties() {
		let mut properties = IndexMap::new();
		properties.insert("loom.region".to_string(), "eu-west".to_string());
		let services = ReleaseServices::new()
			.with_expression_resolver(ExpressionResolver::new().with_system_properties(properties))
			.with_active_profiles(vec!["prod".to_string(), "eu".to_string()]);

		let path = std::env::var("PATH").unwrap_or_default();
		let policy = EnvironmentPolicy::new()
			.with_environment_variable("PATH", "searchPath")
			.with_environment_variable("LOOM_ATTRIBUTES_SURELY_UNSET_VAR", "unset")
			.with_system_property("loom.region", "region")
			.with_system_property("loom.missing", "missing");

		let released = policy.compute(&services);

		if !path.is_empty() {
			assert_eq!(released.get("searchPath"), Some(&[json!(path)][..]));
		}
		assert!(!released.contains("unset"));
		assert_eq!(released.get("region"), Some(&[json!("eu-west")][..]));
		assert!(!released.contains("missing"));
		assert_eq!(
			released.get(APPLICATION_PROFILES_ATTRIBUTE),
			Some(&[json!("prod"), json!("eu")][..])
		);
	}

	#[test]
	fn no_profiles_no_profile_attribute() {
		let released = EnvironmentPolicy::new().compute(&ReleaseServices::new());
		assert!(released.is_empty());
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use indexmap::IndexMap;
use loom_attributes_core::AttributeContainer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::ReleaseServices;

/// Releases configured values regardless of the principal.
///
/// String values are expanded through the expression resolver; other values
/// are released as configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticPolicy {
	#[serde(default)]
	pub allowed_attributes: IndexMap<String, Vec<Value>>,
}

impl StaticPolicy {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_values(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
		self.allowed_attributes.insert(name.into(), values);
		self
	}

	pub(crate) fn compute(&self, services: &ReleaseServices) -> AttributeContainer {
		let resolver = services.expression_resolver();
		self
			.allowed_attributes
			.iter()
			.filter(|(_, values)| !values.is_empty())
			.map(|(name, values)| {
				let values: Vec<Value> = values
					.iter()
					.map(|value| match value {
						Value::String(s) => Value::String(resolver.resolve(s)),
						other => other.clone(),
					})
					.collect();
				(name.as_str(), values)
			})
			.collect()
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute definitions: derived attributes computed at release time.
//!
//! Policies report which definition keys they need; the pipeline seeds any
//! missing key with an empty value list and asks the
//! [`AttributeDefinitionStore`] to resolve the whole set.

use async_trait::async_trait;
use indexmap::IndexMap;
use loom_attributes_core::{value_to_string, AttributeContainer, ReleaseContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, trace};

use crate::error::Result;

/// Resolves attribute definitions into values.
#[async_trait]
pub trait AttributeDefinitionStore: Send + Sync {
	fn is_empty(&self) -> bool;

	fn locate(&self, name: &str) -> Option<AttributeDefinition>;

	/// Resolves `requested` into the final attribute set. Entries with a
	/// definition are computed; entries without one pass through.
	async fn resolve(
		&self,
		requested: AttributeContainer,
		context: &ReleaseContext<'_>,
	) -> Result<AttributeContainer>;
}

/// How a derived attribute is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
	/// Key the definition is requested by.
	pub key: String,
	/// Source attribute to read values from. Defaults to `key`.
	#[serde(default)]
	pub attribute: Option<String>,
	/// Name the resolved values are released under. Defaults to `key`.
	#[serde(default)]
	pub name: Option<String>,
	/// Scope appended to each value as `value@scope`.
	#[serde(default)]
	pub scoped: Option<String>,
	/// Format applied to each value; `{0}` is replaced with the value.
	#[serde(default)]
	pub pattern_format: Option<String>,
}

impl AttributeDefinition {
	pub fn new(key: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			attribute: None,
			name: None,
			scoped: None,
			pattern_format: None,
		}
	}

	pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
		self.attribute = Some(attribute.into());
		self
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scoped = Some(scope.into());
		self
	}

	pub fn with_pattern_format(mut self, format: impl Into<String>) -> Self {
		self.pattern_format = Some(format.into());
		self
	}

	pub fn output_name(&self) -> &str {
		self.name.as_deref().unwrap_or(&self.key)
	}

	fn render(&self, value: &Value) -> Value {
		if self.pattern_format.is_none() && self.scoped.is_none() {
			return value.clone();
		}

		let mut rendered = value_to_string(value);
		if let Some(format) = &self.pattern_format {
			rendered = format.replace("{0}", &rendered);
		}
		if let Some(scope) = &self.scoped {
			rendered = format!("{rendered}@{scope}");
		}
		Value::String(rendered)
	}
}

/// Definition store backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttributeDefinitionStore {
	definitions: IndexMap<String, AttributeDefinition>,
}

impl InMemoryAttributeDefinitionStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_definition(mut self, definition: AttributeDefinition) -> Self {
		self.register(definition);
		self
	}

	pub fn register(&mut self, definition: AttributeDefinition) {
		self
			.definitions
			.insert(definition.key.to_lowercase(), definition);
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}
}

impl FromIterator<AttributeDefinition> for InMemoryAttributeDefinitionStore {
	fn from_iter<I: IntoIterator<Item = AttributeDefinition>>(iter: I) -> Self {
		let mut store = Self::new();
		for definition in iter {
			store.register(definition);
		}
		store
	}
}

#[async_trait]
impl AttributeDefinitionStore for InMemoryAttributeDefinitionStore {
	fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}

	fn locate(&self, name: &str) -> Option<AttributeDefinition> {
		self.definitions.get(&name.to_lowercase()).cloned()
	}

	#[instrument(level = "debug", skip_all, fields(requested = requested.len()))]
	async fn resolve(
		&self,
		requested: AttributeContainer,
		_context: &ReleaseContext<'_>,
	) -> Result<AttributeContainer> {
		let mut resolved = AttributeContainer::new();

		for (name, values) in requested.iter() {
			let Some(definition) = self.locate(name) else {
				if !values.is_empty() {
					resolved.insert(name, values.to_vec());
				}
				continue;
			};

			let source = definition
				.attribute
				.as_deref()
				.and_then(|attribute| requested.get(attribute))
				.unwrap_or(values);
			let rendered: Vec<Value> = source.iter().map(|v| definition.render(v)).collect();

			if rendered.is_empty() {
				trace!(definition = %definition.key, "definition resolved to no values");
				continue;
			}
			resolved.insert(definition.output_name(), rendered);
		}

		Ok(resolved)
	}
}

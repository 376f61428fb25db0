// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Renaming policies.

use indexmap::IndexMap;
use loom_attributes_core::{into_values, AttributeContainer};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::Result;
use crate::pipeline::ReleaseServices;
use crate::script::{ScriptBindings, ScriptReference};

/// One or many names an attribute maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappedTargets {
	One(String),
	Many(Vec<String>),
}

impl MappedTargets {
	pub fn as_slice(&self) -> &[String] {
		match self {
			Self::One(name) => std::slice::from_ref(name),
			Self::Many(names) => names,
		}
	}
}

impl From<&str> for MappedTargets {
	fn from(name: &str) -> Self {
		Self::One(name.to_string())
	}
}

impl From<Vec<&str>> for MappedTargets {
	fn from(names: Vec<&str>) -> Self {
		Self::Many(names.into_iter().map(str::to_string).collect())
	}
}

fn collect_mapping<I, K, T>(mapping: I) -> IndexMap<String, MappedTargets>
where
	I: IntoIterator<Item = (K, T)>,
	K: Into<String>,
	T: Into<MappedTargets>,
{
	mapping
		.into_iter()
		.map(|(name, targets)| (name.into(), targets.into()))
		.collect()
}

/// Releases each source attribute under one or more new names.
///
/// A target may be a script reference; the script's result is released under
/// the source name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedPolicy {
	#[serde(default)]
	pub allowed_attributes: IndexMap<String, MappedTargets>,
}

impl MappedPolicy {
	pub fn new<I, K, T>(mapping: I) -> Self
	where
		I: IntoIterator<Item = (K, T)>,
		K: Into<String>,
		T: Into<MappedTargets>,
	{
		Self {
			allowed_attributes: collect_mapping(mapping),
		}
	}

	pub(crate) fn requested_definitions(&self) -> Vec<String> {
		self.allowed_attributes.keys().cloned().collect()
	}

	pub(crate) async fn compute(
		&self,
		services: &ReleaseServices,
		resolved: &AttributeContainer,
	) -> Result<AttributeContainer> {
		authorize_mapped(&self.allowed_attributes, services, resolved).await
	}
}

/// Releases attributes under configured names, reading values from linked
/// attributes.
///
/// For each released name the linked names are tried in order and the first
/// one with values wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedPolicy {
	#[serde(default)]
	pub allowed_attributes: IndexMap<String, MappedTargets>,
}

impl LinkedPolicy {
	pub fn new<I, K, T>(mapping: I) -> Self
	where
		I: IntoIterator<Item = (K, T)>,
		K: Into<String>,
		T: Into<MappedTargets>,
	{
		Self {
			allowed_attributes: collect_mapping(mapping),
		}
	}

	pub(crate) fn requested_definitions(&self) -> Vec<String> {
		self
			.allowed_attributes
			.values()
			.flat_map(|targets| targets.as_slice())
			.filter(|name| !ScriptReference::is_script(name))
			.cloned()
			.collect()
	}

	pub(crate) async fn compute(
		&self,
		services: &ReleaseServices,
		resolved: &AttributeContainer,
	) -> Result<AttributeContainer> {
		let mut released = AttributeContainer::new();

		for (name, linked) in &self.allowed_attributes {
			let mut found = false;
			for target in linked.as_slice() {
				if let Some(script) = ScriptReference::parse(target) {
					let values = run_mapping_script(&script, services, resolved).await?;
					if !values.is_empty() {
						released.insert(name.as_str(), values);
						found = true;
						break;
					}
					continue;
				}

				match resolved.get(target) {
					Some(values) if !values.is_empty() => {
						released.insert(name.as_str(), values.to_vec());
						found = true;
						break;
					}
					_ => trace!(attribute = %name, linked = %target, "linked attribute has no values"),
				}
			}

			if !found {
				warn!(attribute = %name, "no linked attribute resolved; skipping");
			}
		}

		Ok(released)
	}
}

/// Applies a rename mapping to `resolved`.
///
/// Sources without values are skipped with a warning and never synthesized.
pub(crate) async fn authorize_mapped(
	mapping: &IndexMap<String, MappedTargets>,
	services: &ReleaseServices,
	resolved: &AttributeContainer,
) -> Result<AttributeContainer> {
	let mut released = AttributeContainer::new();

	for (source, targets) in mapping {
		for target in targets.as_slice() {
			if let Some(script) = ScriptReference::parse(target) {
				let values = run_mapping_script(&script, services, resolved).await?;
				if !values.is_empty() {
					released.insert(source.as_str(), values);
				}
				continue;
			}

			match resolved.get(source) {
				Some(values) => {
					trace!(source = %source, target = %target, "mapping attribute");
					released.insert(target.as_str(), values.to_vec());
				}
				None => warn!(source = %source, target = %target, "mapped attribute not resolved; skipping"),
			}
		}
	}

	Ok(released)
}

async fn run_mapping_script(
	script: &ScriptReference,
	services: &ReleaseServices,
	resolved: &AttributeContainer,
) -> Result<Vec<serde_json::Value>> {
	let bindings = ScriptBindings::new(resolved.clone());
	let value = script.execute(services.script_executor(), &bindings).await?;
	Ok(into_values(value))
}

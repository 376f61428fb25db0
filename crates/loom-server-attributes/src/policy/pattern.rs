// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::LazyLock;

use indexmap::IndexMap;
use loom_attributes_core::{value_to_string, AttributeContainer};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::Result;

static GROUP_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{(\d+)\}").unwrap());

/// A regex and the template matching values are rewritten with.
///
/// `${n}` in `transform` is replaced with capture group `n`; a group that did
/// not participate in the match is replaced with nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
	pub pattern: String,
	pub transform: String,
}

impl PatternRule {
	pub fn new(pattern: impl Into<String>, transform: impl Into<String>) -> Self {
		Self {
			pattern: pattern.into(),
			transform: transform.into(),
		}
	}

	fn apply(&self, regex: &Regex, value: &str) -> Option<String> {
		let captures = regex.captures(value)?;
		let rendered = GROUP_PLACEHOLDER.replace_all(&self.transform, |placeholder: &Captures| {
			placeholder[1]
				.parse::<usize>()
				.ok()
				.and_then(|group| captures.get(group))
				.map(|m| m.as_str().to_string())
				.unwrap_or_default()
		});
		Some(rendered.into_owned())
	}
}

/// Rewrites resolved values with per-attribute regex rules.
///
/// Values that do not match contribute nothing; attributes left without values
/// are not released.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternPolicy {
	#[serde(default)]
	pub allowed_attributes: IndexMap<String, PatternRule>,
}

impl PatternPolicy {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_rule(mut self, name: impl Into<String>, rule: PatternRule) -> Self {
		self.allowed_attributes.insert(name.into(), rule);
		self
	}

	pub(crate) fn requested_definitions(&self) -> Vec<String> {
		self.allowed_attributes.keys().cloned().collect()
	}

	pub(crate) fn compute(&self, resolved: &AttributeContainer) -> Result<AttributeContainer> {
		let mut released = AttributeContainer::new();

		for (name, rule) in &self.allowed_attributes {
			let Some(values) = resolved.get(name) else {
				trace!(attribute = %name, "pattern attribute not resolved");
				continue;
			};
			let regex = Regex::new(&rule.pattern)?;

			let transformed: Vec<Value> = values
				.iter()
				.filter_map(|value| rule.apply(&regex, &value_to_string(value)))
				.map(Value::String)
				.collect();

			if transformed.is_empty() {
				trace!(attribute = %name, "no values matched pattern");
				continue;
			}
			let stored = resolved.stored_name(name).unwrap_or(name);
			released.insert(stored, transformed);
		}

		Ok(released)
	}
}

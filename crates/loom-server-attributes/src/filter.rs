// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute filters run as the last pipeline step.

use loom_attributes_core::{value_to_string, AttributeContainer};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Post-processes the merged release set.
pub trait AttributeFilter: Send + Sync {
	fn filter(&self, attributes: AttributeContainer) -> AttributeContainer;
}

/// Built-in filters that can be configured on a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeFilterConfig {
	/// Keeps values matching `pattern`; attributes left without values are
	/// dropped. With `complete_match` the whole value must match.
	Regex {
		pattern: String,
		#[serde(default)]
		complete_match: bool,
	},
	/// Applies each filter in order.
	Chaining { filters: Vec<AttributeFilterConfig> },
}

impl AttributeFilterConfig {
	pub fn regex(pattern: impl Into<String>) -> Self {
		Self::Regex {
			pattern: pattern.into(),
			complete_match: false,
		}
	}

	fn filter_regex(
		pattern: &str,
		complete_match: bool,
		mut attributes: AttributeContainer,
	) -> AttributeContainer {
		let source = if complete_match {
			format!("^(?:{pattern})$")
		} else {
			pattern.to_string()
		};
		let regex = match Regex::new(&source) {
			Ok(regex) => regex,
			Err(error) => {
				warn!(%error, pattern, "invalid attribute filter pattern; releasing nothing");
				return AttributeContainer::new();
			}
		};

		attributes.map_values(|_, values| {
			values.retain(|value| regex.is_match(&value_to_string(value)));
		});
		attributes.retain(|_, values| !values.is_empty());
		attributes
	}
}

impl AttributeFilter for AttributeFilterConfig {
	fn filter(&self, attributes: AttributeContainer) -> AttributeContainer {
		match self {
			Self::Regex {
				pattern,
				complete_match,
			} => Self::filter_regex(pattern, *complete_match, attributes),
			Self::Chaining { filters } => filters
				.iter()
				.fold(attributes, |attributes, filter| filter.filter(attributes)),
		}
	}
}

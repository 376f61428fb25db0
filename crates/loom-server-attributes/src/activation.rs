// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Activation criteria decide whether a policy applies to a principal at all.

use indexmap::IndexMap;
use loom_attributes_core::{value_to_string, Principal};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How multiple required attributes combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
	#[default]
	And,
	Or,
}

/// Gate evaluated before anything else in the release pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivationCriteria {
	/// Requires principal attributes whose values match the given patterns.
	///
	/// Each entry maps an attribute name to value patterns; an attribute
	/// matches when any of its values fully matches any pattern. A missing
	/// attribute or an invalid pattern never matches. `reverse_match` inverts
	/// the final answer.
	PrincipalAttributes {
		#[serde(default)]
		required_attributes: IndexMap<String, Vec<String>>,
		#[serde(default)]
		operator: LogicalOperator,
		#[serde(default)]
		reverse_match: bool,
	},
}

impl ActivationCriteria {
	pub fn principal_attributes<I, K, V>(required: I, operator: LogicalOperator) -> Self
	where
		I: IntoIterator<Item = (K, Vec<V>)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self::PrincipalAttributes {
			required_attributes: required
				.into_iter()
				.map(|(name, patterns)| (name.into(), patterns.into_iter().map(Into::into).collect()))
				.collect(),
			operator,
			reverse_match: false,
		}
	}

	pub fn reversed(mut self) -> Self {
		match &mut self {
			Self::PrincipalAttributes { reverse_match, .. } => *reverse_match = !*reverse_match,
		}
		self
	}

	pub fn is_satisfied(&self, principal: &Principal) -> bool {
		match self {
			Self::PrincipalAttributes {
				required_attributes,
				operator,
				reverse_match,
			} => {
				let matched = if required_attributes.is_empty() {
					true
				} else {
					let mut results = required_attributes
						.iter()
						.map(|(name, patterns)| attribute_matches(principal, name, patterns));
					match operator {
						LogicalOperator::And => results.all(|matched| matched),
						LogicalOperator::Or => results.any(|matched| matched),
					}
				};

				let satisfied = matched != *reverse_match;
				debug!(principal_id = %principal.id, satisfied, "activation criteria evaluated");
				satisfied
			}
		}
	}
}

fn attribute_matches(principal: &Principal, name: &str, patterns: &[String]) -> bool {
	let Some(values) = principal.attributes.get(name) else {
		return false;
	};

	patterns.iter().any(|pattern| {
		let regex = match Regex::new(&format!("^(?:{pattern})$")) {
			Ok(regex) => regex,
			Err(error) => {
				warn!(%error, attribute = name, pattern, "invalid activation pattern");
				return false;
			}
		};
		values
			.iter()
			.any(|value| regex.is_match(&value_to_string(value)))
	})
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Case canonicalization of released values.

use loom_attributes_core::AttributeContainer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How string values are cased before release. Non-string values are untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalizationMode {
	#[default]
	None,
	Lower,
	Upper,
}

impl CanonicalizationMode {
	pub fn apply_str(self, value: &str) -> String {
		match self {
			Self::None => value.to_string(),
			Self::Lower => value.to_lowercase(),
			Self::Upper => value.to_uppercase(),
		}
	}

	pub fn apply(self, attributes: &mut AttributeContainer) {
		if self == Self::None {
			return;
		}
		attributes.map_values(|_, values| {
			for value in values.iter_mut() {
				if let Value::String(s) = value {
					*s = self.apply_str(s);
				}
			}
		});
	}
}

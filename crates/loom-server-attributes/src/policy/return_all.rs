// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use loom_attributes_core::AttributeContainer;
use serde::{Deserialize, Serialize};

/// Releases every resolved attribute except the excluded ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnAllPolicy {
	#[serde(default)]
	pub excluded_attributes: Vec<String>,
}

impl ReturnAllPolicy {
	pub fn excluding<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			excluded_attributes: names.into_iter().map(Into::into).collect(),
		}
	}

	pub(crate) fn compute(&self, resolved: &AttributeContainer) -> AttributeContainer {
		let mut released = resolved.clone();
		for name in &self.excluded_attributes {
			released.remove(name);
		}
		released
	}
}

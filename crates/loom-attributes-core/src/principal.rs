// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authenticated subject and the service it is signing on to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::container::AttributeContainer;

/// An authenticated subject with its raw attributes.
///
/// Produced by the authentication subsystem; the release engine only reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Principal {
	pub id: String,
	#[serde(default)]
	pub attributes: AttributeContainer,
}

impl Principal {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			attributes: AttributeContainer::new(),
		}
	}

	pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
		self.attributes.insert(name, values);
		self
	}

	pub fn with_attributes(mut self, attributes: AttributeContainer) -> Self {
		self.attributes = attributes;
		self
	}
}

/// The service selected for this sign-on, i.e. the target the ticket or
/// token is issued for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Service {
	pub id: String,
}

impl Service {
	pub fn new(id: impl Into<String>) -> Self {
		Self { id: id.into() }
	}
}

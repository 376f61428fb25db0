// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use base64::{engine::general_purpose::STANDARD, Engine};
use loom_attributes_core::{value_to_string, AttributeContainer, ReleaseContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::allowed::{plain_names, release_allowed};
use crate::cipher::load_public_key;
use crate::error::{ReleaseError, Result};
use crate::pipeline::ReleaseServices;

/// Releases allowed attributes with every value encrypted for the service.
///
/// Each value is encrypted with the registered service's public key and
/// base64 encoded. Without a usable key nothing is released.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptingPolicy {
	#[serde(default)]
	pub allowed_attributes: Vec<String>,
}

impl EncryptingPolicy {
	pub fn new<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			allowed_attributes: names.into_iter().map(Into::into).collect(),
		}
	}

	pub(crate) fn requested_definitions(&self) -> Vec<String> {
		plain_names(&self.allowed_attributes)
	}

	pub(crate) async fn compute(
		&self,
		services: &ReleaseServices,
		context: &ReleaseContext<'_>,
		resolved: &AttributeContainer,
	) -> Result<AttributeContainer> {
		let registered_service = context.registered_service;
		let public_key =
			registered_service
				.public_key
				.as_ref()
				.ok_or_else(|| ReleaseError::MissingPublicKey {
					service: registered_service.name.clone(),
				})?;

		let public_key = load_public_key(public_key).await?;
		let allowed = release_allowed(&self.allowed_attributes, services, context, resolved).await?;
		let cipher = services.cipher();

		let mut released = AttributeContainer::new();
		for (name, values) in allowed {
			let encrypted = values
				.iter()
				.map(|value| -> Result<Value> {
					let ciphertext = cipher.encrypt(value_to_string(value).as_bytes(), &public_key)?;
					Ok(Value::String(STANDARD.encode(ciphertext)))
				})
				.collect::<Result<Vec<Value>>>()?;
			released.insert(name, encrypted);
		}

		debug!(released = released.len(), "encrypted attributes for release");
		Ok(released)
	}
}

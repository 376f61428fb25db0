// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Username providers a registered service can carry.
//!
//! The pipeline writes the provider's answer under the policy's
//! `principal_id_attribute`, overriding anything the policy released there.

use loom_attributes_core::{
	value_to_string, Principal, RegisteredService, Service, UsernameAttributeProvider,
};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::canonicalization::CanonicalizationMode;

/// Releases the principal id.
#[derive(Debug, Clone, Default)]
pub struct DefaultUsernameProvider {
	pub canonicalization: CanonicalizationMode,
}

impl DefaultUsernameProvider {
	pub fn new() -> Self {
		Self::default()
	}
}

impl UsernameAttributeProvider for DefaultUsernameProvider {
	fn resolve_username(
		&self,
		principal: &Principal,
		_service: &Service,
		_registered_service: &RegisteredService,
	) -> String {
		self.canonicalization.apply_str(&principal.id)
	}
}

/// Releases the first value of a principal attribute, falling back to the
/// principal id when the attribute is absent.
#[derive(Debug, Clone)]
pub struct PrincipalAttributeUsernameProvider {
	pub attribute: String,
	pub canonicalization: CanonicalizationMode,
}

impl PrincipalAttributeUsernameProvider {
	pub fn new(attribute: impl Into<String>) -> Self {
		Self {
			attribute: attribute.into(),
			canonicalization: CanonicalizationMode::None,
		}
	}
}

impl UsernameAttributeProvider for PrincipalAttributeUsernameProvider {
	fn resolve_username(
		&self,
		principal: &Principal,
		_service: &Service,
		registered_service: &RegisteredService,
	) -> String {
		let username = principal
			.attributes
			.get(&self.attribute)
			.and_then(|values| values.first())
			.map(value_to_string)
			.unwrap_or_else(|| {
				debug!(
					attribute = %self.attribute,
					registered_service = registered_service.id,
					"username attribute missing; using principal id"
				);
				principal.id.clone()
			});
		self.canonicalization.apply_str(&username)
	}
}

/// Releases a stable, per-service opaque identifier.
///
/// The identifier is the hex SHA-256 of the selected service id, the principal
/// id and a salt, so the same principal gets a different identifier at each
/// service.
#[derive(Debug, Clone)]
pub struct AnonymousUsernameProvider {
	salt: String,
}

impl AnonymousUsernameProvider {
	pub fn new(salt: impl Into<String>) -> Self {
		Self { salt: salt.into() }
	}
}

impl UsernameAttributeProvider for AnonymousUsernameProvider {
	fn resolve_username(
		&self,
		principal: &Principal,
		service: &Service,
		_registered_service: &RegisteredService,
	) -> String {
		let mut hasher = Sha256::new();
		hasher.update(service.id.as_bytes());
		hasher.update(b"!");
		hasher.update(principal.id.as_bytes());
		hasher.update(b"!");
		hasher.update(self.salt.as_bytes());
		hex::encode(hasher.finalize())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn fixtures() -> (Principal, Service, RegisteredService) {
		(
			Principal::new("JDoe").with_attribute("mail", vec![json!("jdoe@example.com")]),
			Service::new("https://app.example.com"),
			RegisteredService::new(1, "app", "https://app.example.com"),
		)
	}

	#[test]
	fn default_provider_returns_principal_id() {
		let (principal, service, registered) = fixtures();
		let provider = DefaultUsernameProvider {
			canonicalization: CanonicalizationMode::Lower,
		};
		assert_eq!(
			provider.resolve_username(&principal, &service, &registered),
			"jdoe"
		);
	}

	#[test]
	fn attribute_provider_uses_first_value() {
		let (principal, service, registered) = fixtures();
		let provider = PrincipalAttributeUsernameProvider::new("mail");
		assert_eq!(
			provider.resolve_username(&principal, &service, &registered),
			"jdoe@example.com"
		);
	}

	#[test]
	fn attribute_provider_falls_back_to_id() {
		let (principal, service, registered) = fixtures();
		let provider = PrincipalAttributeUsernameProvider::new("employeeNumber");
		assert_eq!(
			provider.resolve_username(&principal, &service, &registered),
			"JDoe"
		);
	}

	#[test]
	fn anonymous_provider_is_stable_and_per_service() {
		let (principal, service, registered) = fixtures();
		let provider = AnonymousUsernameProvider::new("pepper");

		let first = provider.resolve_username(&principal, &service, &registered);
		let second = provider.resolve_username(&principal, &service, &registered);
		let other = provider.resolve_username(
			&principal,
			&Service::new("https://other.example.com"),
			&registered,
		);

		assert_eq!(first, second);
		assert_ne!(first, other);
		assert_eq!(first.len(), 64);
		assert_ne!(first, principal.id);
	}
}

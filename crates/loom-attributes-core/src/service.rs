// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Relying-party registrations as seen by the release engine.
//!
//! A [`RegisteredService`] is owned by the service registry. The engine reads
//! three things from it: the public key used by encrypting policies, the
//! consent policy used to narrow the consent view, and an optional
//! [`UsernameAttributeProvider`] that decides the username released for the
//! principal.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AttributesError, Result};
use crate::principal::{Principal, Service};

/// Default asymmetric algorithm for service public keys.
pub const DEFAULT_PUBLIC_KEY_ALGORITHM: &str = "RSA";

/// Resolves the username released for a principal to a specific service.
pub trait UsernameAttributeProvider: Send + Sync {
	fn resolve_username(
		&self,
		principal: &Principal,
		service: &Service,
		registered_service: &RegisteredService,
	) -> String;
}

/// Public key material registered for a service.
///
/// `location` is either inline PEM text, a `file:` URI, or a plain path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredServicePublicKey {
	pub location: String,
	#[serde(default = "default_algorithm")]
	pub algorithm: String,
}

fn default_algorithm() -> String {
	DEFAULT_PUBLIC_KEY_ALGORITHM.to_string()
}

impl RegisteredServicePublicKey {
	pub fn new(location: impl Into<String>) -> Self {
		Self {
			location: location.into(),
			algorithm: default_algorithm(),
		}
	}

	pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
		self.algorithm = algorithm.into();
		self
	}

	/// Where the PEM text for this key lives.
	pub fn source(&self) -> Result<PublicKeySource<'_>> {
		let location = self.location.trim();
		if location.is_empty() {
			return Err(AttributesError::EmptyPublicKeyLocation);
		}
		if location.contains("-----BEGIN") {
			return Ok(PublicKeySource::Inline(location));
		}
		let path = location.strip_prefix("file:").unwrap_or(location);
		Ok(PublicKeySource::File(PathBuf::from(path)))
	}
}

/// A resolved [`RegisteredServicePublicKey::location`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeySource<'a> {
	Inline(&'a str),
	File(PathBuf),
}

/// Narrows what a consent prompt shows for a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentPolicy {
	#[serde(default)]
	pub excluded_attributes: Vec<String>,
	#[serde(default)]
	pub include_only_attributes: Vec<String>,
}

impl ConsentPolicy {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn excluding<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.excluded_attributes = names.into_iter().map(Into::into).collect();
		self
	}

	pub fn including_only<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.include_only_attributes = names.into_iter().map(Into::into).collect();
		self
	}
}

/// A relying party registration.
#[derive(Clone, Default)]
pub struct RegisteredService {
	pub id: i64,
	pub name: String,
	/// Identifier or pattern the registration matches selected services with.
	pub service_id: String,
	pub public_key: Option<RegisteredServicePublicKey>,
	pub consent_policy: Option<ConsentPolicy>,
	pub username_attribute_provider: Option<Arc<dyn UsernameAttributeProvider>>,
}

impl RegisteredService {
	pub fn new(id: i64, name: impl Into<String>, service_id: impl Into<String>) -> Self {
		Self {
			id,
			name: name.into(),
			service_id: service_id.into(),
			..Default::default()
		}
	}

	pub fn with_public_key(mut self, public_key: RegisteredServicePublicKey) -> Self {
		self.public_key = Some(public_key);
		self
	}

	pub fn with_consent_policy(mut self, consent_policy: ConsentPolicy) -> Self {
		self.consent_policy = Some(consent_policy);
		self
	}

	pub fn with_username_provider(mut self, provider: Arc<dyn UsernameAttributeProvider>) -> Self {
		self.username_attribute_provider = Some(provider);
		self
	}
}

impl fmt::Debug for RegisteredService {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RegisteredService")
			.field("id", &self.id)
			.field("name", &self.name)
			.field("service_id", &self.service_id)
			.field("public_key", &self.public_key)
			.field("consent_policy", &self.consent_policy)
			.field(
				"username_attribute_provider",
				&self.username_attribute_provider.is_some(),
			)
			.finish()
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Asymmetric encryption of released attribute values.

use loom_attributes_core::{AttributesError, PublicKeySource, RegisteredServicePublicKey};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use tracing::{instrument, trace};

use crate::error::{ReleaseError, Result};

/// Encrypts bytes for a service with its parsed public key.
pub trait PublicKeyCipher: Send + Sync {
	fn encrypt(&self, plaintext: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>>;
}

/// RSA PKCS#1 v1.5 encryption.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaCipher;

impl RsaCipher {
	pub fn new() -> Self {
		Self
	}
}

impl PublicKeyCipher for RsaCipher {
	fn encrypt(&self, plaintext: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>> {
		let mut rng = rand::rngs::OsRng;
		public_key
			.encrypt(&mut rng, Pkcs1v15Encrypt, plaintext)
			.map_err(|e| ReleaseError::Cipher(format!("encryption failed: {e}")))
	}
}

/// Reads and parses a registered service's public key.
///
/// Accepts SPKI (`BEGIN PUBLIC KEY`) and PKCS#1 (`BEGIN RSA PUBLIC KEY`) PEM,
/// inline or from a file.
#[instrument(level = "trace", skip_all, fields(algorithm = %public_key.algorithm))]
pub async fn load_public_key(public_key: &RegisteredServicePublicKey) -> Result<RsaPublicKey> {
	if !public_key.algorithm.eq_ignore_ascii_case("RSA") {
		return Err(ReleaseError::UnsupportedAlgorithm(
			public_key.algorithm.clone(),
		));
	}

	let pem = match public_key.source()? {
		PublicKeySource::Inline(pem) => pem.to_string(),
		PublicKeySource::File(path) => {
			trace!(path = %path.display(), "reading public key file");
			tokio::fs::read_to_string(&path)
				.await
				.map_err(|source| AttributesError::PublicKeyRead { path, source })?
		}
	};

	RsaPublicKey::from_public_key_pem(&pem)
		.or_else(|_| RsaPublicKey::from_pkcs1_pem(&pem))
		.map_err(|e| ReleaseError::Cipher(format!("invalid RSA public key: {e}")))
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Encrypted attribute release with real RSA keys.

mod common;

use base64::{engine::general_purpose::STANDARD, Engine};
use common::Fixture;
use loom_attributes_core::RegisteredServicePublicKey;
use loom_server_attributes::{
	AttributeReleasePolicy, CanonicalizationMode, EncryptingPolicy, PolicyKind, ReleaseEngine,
	ReleaseServices,
};
use rsa::pkcs1::{EncodeRsaPublicKey, LineEnding};
use rsa::pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use serde_json::json;

fn keypair() -> RsaPrivateKey {
	let mut rng = rand::rngs::OsRng;
	RsaPrivateKey::new(&mut rng, 1024).unwrap()
}

fn decrypt(private_key: &RsaPrivateKey, value: &serde_json::Value) -> String {
	let ciphertext = STANDARD.decode(value.as_str().unwrap()).unwrap();
	String::from_utf8(private_key.decrypt(Pkcs1v15Encrypt, &ciphertext).unwrap()).unwrap()
}

fn encrypting(names: &[&str]) -> AttributeReleasePolicy {
	AttributeReleasePolicy::new(PolicyKind::Encrypting(EncryptingPolicy::new(
		names.iter().copied(),
	)))
}

#[tokio::test]
async fn values_are_encrypted_for_the_service_key() {
	let private_key = keypair();
	let pem = RsaPublicKey::from(&private_key)
		.to_public_key_pem(LineEnding::LF)
		.unwrap();

	let mut fixture = Fixture::new();
	fixture.registered = fixture
		.registered
		.with_public_key(RegisteredServicePublicKey::new(pem));

	let released = ReleaseEngine::default()
		.release(
			&encrypting(&["mail", "cn", "missing"]),
			&fixture.principal,
			&fixture.service,
			&fixture.registered,
		)
		.await;

	assert_eq!(released.names().collect::<Vec<_>>(), vec!["mail", "cn"]);
	let mail = released.get("mail").unwrap();
	assert_ne!(mail[0], json!("a@x.com"));
	assert_eq!(decrypt(&private_key, &mail[0]), "a@x.com");
	assert_eq!(decrypt(&private_key, &released.get("cn").unwrap()[0]), "Jane Doe");
}

#[tokio::test]
async fn pkcs1_key_files_are_supported() {
	let private_key = keypair();
	let pem = RsaPublicKey::from(&private_key)
		.to_pkcs1_pem(LineEnding::LF)
		.unwrap();

	let dir = tempfile::tempdir().unwrap();
	let key_path = dir.path().join("service.pem");
	std::fs::write(&key_path, pem).unwrap();

	let mut fixture = Fixture::new();
	fixture.registered = fixture.registered.with_public_key(RegisteredServicePublicKey::new(
		format!("file:{}", key_path.display()),
	));

	let released = ReleaseEngine::default()
		.release(
			&encrypting(&["dept", "mail", "cn"]),
			&fixture.principal,
			&fixture.service,
			&fixture.registered,
		)
		.await;

	assert_eq!(decrypt(&private_key, &released.get("dept").unwrap()[0]), "eng");
	assert_eq!(decrypt(&private_key, &released.get("mail").unwrap()[0]), "a@x.com");
	assert_eq!(decrypt(&private_key, &released.get("cn").unwrap()[0]), "Jane Doe");
}

#[tokio::test]
async fn canonicalization_leaves_ciphertext_intact() {
	let private_key = keypair();
	let pem = RsaPublicKey::from(&private_key)
		.to_public_key_pem(LineEnding::LF)
		.unwrap();

	let mut fixture = Fixture::new();
	fixture.registered = fixture
		.registered
		.with_public_key(RegisteredServicePublicKey::new(pem));

	for mode in [CanonicalizationMode::Lower, CanonicalizationMode::Upper] {
		let policy = encrypting(&["mail", "cn"]).with_canonicalization(mode);
		let released = ReleaseEngine::default()
			.release(&policy, &fixture.principal, &fixture.service, &fixture.registered)
			.await;

		assert_eq!(decrypt(&private_key, &released.get("mail").unwrap()[0]), "a@x.com");
		assert_eq!(decrypt(&private_key, &released.get("cn").unwrap()[0]), "Jane Doe");
	}
}

#[tokio::test]
async fn unsupported_algorithm_releases_nothing() {
	let private_key = keypair();
	let pem = RsaPublicKey::from(&private_key)
		.to_public_key_pem(LineEnding::LF)
		.unwrap();

	let mut fixture = Fixture::new();
	fixture.registered = fixture
		.registered
		.with_public_key(RegisteredServicePublicKey::new(pem).with_algorithm("EC"));

	let engine = ReleaseEngine::new(
		ReleaseServices::new().with_default_attributes(vec!["cn".to_string()]),
	);
	let released = engine
		.release(
			&encrypting(&["mail"]),
			&fixture.principal,
			&fixture.service,
			&fixture.registered,
		)
		.await;

	assert!(released.is_empty());
}

#[tokio::test]
async fn unreadable_key_file_releases_nothing() {
	let mut fixture = Fixture::new();
	fixture.registered = fixture.registered.with_public_key(RegisteredServicePublicKey::new(
		"file:/nonexistent/service.pem",
	));

	let released = ReleaseEngine::default()
		.release(
			&encrypting(&["mail"]),
			&fixture.principal,
			&fixture.service,
			&fixture.registered,
		)
		.await;

	assert!(released.is_empty());
}

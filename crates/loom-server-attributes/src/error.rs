// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for attribute release.
//!
//! These errors never leave the release pipeline: the engine logs them and
//! releases nothing for the failing policy.

use std::path::PathBuf;

use loom_attributes_core::AttributesError;
use thiserror::Error;

/// Result type for release operations.
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Errors that can occur while computing a release.
#[derive(Debug, Error)]
pub enum ReleaseError {
	#[error("no script executor is configured")]
	ScriptExecutorUnavailable,

	#[error("script not found at {path}: {source}")]
	ScriptNotFound {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("script execution failed: {0}")]
	Script(String),

	#[error("script returned {found}, expected {expected}")]
	ScriptResult {
		expected: &'static str,
		found: String,
	},

	#[error("registered service '{service}' has no public key")]
	MissingPublicKey { service: String },

	#[error("unsupported public key algorithm: {0}")]
	UnsupportedAlgorithm(String),

	#[error("cipher error: {0}")]
	Cipher(String),

	#[error(transparent)]
	PublicKey(#[from] AttributesError),

	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("endpoint {url} returned status {status}")]
	HttpStatus { url: String, status: u16 },

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("invalid pattern: {0}")]
	InvalidPattern(#[from] regex::Error),

	#[error("principal attribute repository error: {0}")]
	Repository(String),

	#[error("configuration error: {0}")]
	Config(String),
}

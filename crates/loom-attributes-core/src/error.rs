// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the attribute data model.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for data-model operations.
pub type Result<T> = std::result::Result<T, AttributesError>;

/// Errors raised by the data model itself.
#[derive(Debug, Error)]
pub enum AttributesError {
	#[error("failed to read public key from {path}: {source}")]
	PublicKeyRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("public key location is empty")]
	EmptyPublicKeyLocation,
}

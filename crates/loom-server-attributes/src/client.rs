// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client used for remote attribute release.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::config::ReleaseConfig;
use crate::error::Result;

/// Returns the default User-Agent string.
///
/// Format: `loom-attributes/{version}`
pub fn user_agent() -> String {
	format!("loom-attributes/{}", env!("CARGO_PKG_VERSION"))
}

/// Creates a client builder with the given User-Agent header.
pub fn builder_with_user_agent(user_agent: impl Into<String>) -> ClientBuilder {
	Client::builder().user_agent(user_agent.into())
}

/// Creates a client with the configured User-Agent and request timeout.
pub fn new_client(config: &ReleaseConfig) -> Result<Client> {
	let client = builder_with_user_agent(config.user_agent.clone())
		.timeout(Duration::from_secs(config.http_timeout_secs))
		.build()?;
	Ok(client)
}

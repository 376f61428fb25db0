// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the release engine.
//!
//! Sources are merged in precedence order (highest wins):
//! 1. Environment variables (`LOOM_SERVER_ATTRIBUTES_*`)
//! 2. Config file (`/etc/loom/attributes.toml`)
//! 3. Built-in defaults
//!
//! ```toml
//! default_attributes = ["mail", "cn"]
//! active_profiles = ["prod"]
//! http_timeout_secs = 5
//!
//! [system_properties]
//! "loom.region" = "eu-west"
//! ```

mod error;
mod sources;

pub use error::ConfigError;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::client;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Fully resolved release configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
	/// Attributes released to every service when present, unless a policy
	/// excludes the default bundle.
	pub default_attributes: Vec<String>,
	pub active_profiles: Vec<String>,
	pub system_properties: IndexMap<String, String>,
	pub http_timeout_secs: u64,
	pub user_agent: String,
}

impl Default for ReleaseConfig {
	fn default() -> Self {
		ReleaseConfigLayer::default().finalize()
	}
}

/// Release configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReleaseConfigLayer {
	#[serde(default)]
	pub default_attributes: Option<Vec<String>>,
	#[serde(default)]
	pub active_profiles: Option<Vec<String>>,
	#[serde(default)]
	pub system_properties: Option<IndexMap<String, String>>,
	#[serde(default)]
	pub http_timeout_secs: Option<u64>,
	#[serde(default)]
	pub user_agent: Option<String>,
}

impl ReleaseConfigLayer {
	pub fn merge(&mut self, other: ReleaseConfigLayer) {
		if other.default_attributes.is_some() {
			self.default_attributes = other.default_attributes;
		}
		if other.active_profiles.is_some() {
			self.active_profiles = other.active_profiles;
		}
		if let Some(properties) = other.system_properties {
			self
				.system_properties
				.get_or_insert_with(IndexMap::new)
				.extend(properties);
		}
		if other.http_timeout_secs.is_some() {
			self.http_timeout_secs = other.http_timeout_secs;
		}
		if other.user_agent.is_some() {
			self.user_agent = other.user_agent;
		}
	}

	pub fn finalize(self) -> ReleaseConfig {
		ReleaseConfig {
			default_attributes: self.default_attributes.unwrap_or_default(),
			active_profiles: self.active_profiles.unwrap_or_default(),
			system_properties: self.system_properties.unwrap_or_default(),
			http_timeout_secs: self
				.http_timeout_secs
				.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
			user_agent: self.user_agent.unwrap_or_else(client::user_agent),
		}
	}
}

/// Load configuration from all sources with standard precedence.
pub fn load_config() -> Result<ReleaseConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::new()),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ReleaseConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::new()),
	])
}

/// Merges `sources` in precedence order and finalizes the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ReleaseConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ReleaseConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	let config = merged.finalize();
	validate(&config)?;

	info!(
		default_attributes = config.default_attributes.len(),
		active_profiles = config.active_profiles.len(),
		http_timeout_secs = config.http_timeout_secs,
		"attribute release configuration loaded"
	);
	Ok(config)
}

fn validate(config: &ReleaseConfig) -> Result<(), ConfigError> {
	if config.http_timeout_secs == 0 {
		return Err(ConfigError::InvalidValue {
			key: "http_timeout_secs".to_string(),
			message: "must be greater than zero".to_string(),
		});
	}
	if config
		.default_attributes
		.iter()
		.any(|name| name.trim().is_empty())
	{
		return Err(ConfigError::InvalidValue {
			key: "default_attributes".to_string(),
			message: "attribute names must not be blank".to_string(),
		});
	}
	Ok(())
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use super::error::ConfigError;
use super::ReleaseConfigLayer;

const ENV_PREFIX: &str = "LOOM_SERVER_ATTRIBUTES_";

/// Where a layer came from. Later sources override earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// A provider of one [`ReleaseConfigLayer`].
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ReleaseConfigLayer, ConfigError>;
}

/// The empty layer; [`ReleaseConfigLayer::finalize`] supplies the defaults.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ReleaseConfigLayer, ConfigError> {
		Ok(ReleaseConfigLayer::default())
	}
}

/// An optional `attributes.toml`. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub const SYSTEM_PATH: &'static str = "/etc/loom/attributes.toml";

	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(Self::SYSTEM_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"attributes-toml"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ReleaseConfigLayer, ConfigError> {
		let content = match std::fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
				debug!(path = %self.path.display(), "no attribute release config file");
				return Ok(ReleaseConfigLayer::default());
			}
			Err(source) => {
				return Err(ConfigError::FileRead {
					path: self.path.clone(),
					source,
				})
			}
		};

		let layer = toml::from_str::<ReleaseConfigLayer>(&content).map_err(|source| {
			ConfigError::TomlParse {
				path: self.path.clone(),
				source,
			}
		})?;
		trace!(path = %self.path.display(), "attribute release config file parsed");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `LOOM_SERVER_ATTRIBUTES_<FIELD>`. List values are comma
/// separated. System properties are only read from files.
#[derive(Default)]
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Reads the process environment.
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads from a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(
				vars
					.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	fn var(&self, field: &str) -> Option<String> {
		let name = format!("{ENV_PREFIX}{field}");
		let value = match &self.vars {
			Some(vars) => vars.get(&name).cloned(),
			None => std::env::var(&name).ok(),
		};
		value.filter(|s| !s.is_empty())
	}

	fn list(&self, field: &str) -> Option<Vec<String>> {
		self.var(field).map(|value| {
			value
				.split(',')
				.map(str::trim)
				.filter(|s| !s.is_empty())
				.map(str::to_string)
				.collect()
		})
	}

	fn u64(&self, field: &str) -> Result<Option<u64>, ConfigError> {
		match self.var(field) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: format!("{ENV_PREFIX}{field}"),
				message: format!("invalid u64 value '{v}'"),
			}),
			None => Ok(None),
		}
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ReleaseConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ReleaseConfigLayer {
			default_attributes: self.list("DEFAULT_ATTRIBUTES"),
			active_profiles: self.list("ACTIVE_PROFILES"),
			system_properties: None,
			http_timeout_secs: self.u64("HTTP_TIMEOUT_SECS")?,
			user_agent: self.var("USER_AGENT"),
		})
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Script references and the script executor seam.
//!
//! Several policies accept a script in place of an attribute name or value.
//! The engine never embeds a scripting runtime: it recognizes script
//! references, loads external script bodies, and hands the body plus a set of
//! bindings to an injected [`ScriptExecutor`].
//!
//! Two reference forms are recognized:
//!
//! - inline: `script { return attributes.uid }`
//! - external: `file:/etc/loom/scripts/release.script`

use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use loom_attributes_core::{AttributeContainer, ContextSummary};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{ReleaseError, Result};

/// Tracing target scripts are expected to log under.
pub const SCRIPT_LOG_TARGET: &str = "loom_server_attributes::script";

static INLINE_SCRIPT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)^\s*script\s*\{(.*)\}\s*$").unwrap());

/// Executes script bodies on behalf of release policies.
///
/// Implementations own sandboxing and runtime availability. The returned value
/// is interpreted by the caller: policies that expect a map require a JSON
/// object, policies that expect values accept a list or a scalar.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
	async fn execute(&self, script: &str, bindings: &ScriptBindings) -> Result<Value>;
}

/// Values made available to a script.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptBindings {
	pub attributes: AttributeContainer,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub context: Option<ContextSummary>,
	pub log_target: &'static str,
}

impl ScriptBindings {
	pub fn new(attributes: AttributeContainer) -> Self {
		Self {
			attributes,
			context: None,
			log_target: SCRIPT_LOG_TARGET,
		}
	}

	pub fn with_context(mut self, context: ContextSummary) -> Self {
		self.context = Some(context);
		self
	}
}

/// A script given inline or by file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptReference {
	Inline(String),
	External(PathBuf),
}

impl ScriptReference {
	/// Recognizes a script reference, or returns `None` for a plain value.
	pub fn parse(value: &str) -> Option<Self> {
		if let Some(captures) = INLINE_SCRIPT.captures(value) {
			let body = captures.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
			return Some(Self::Inline(body.to_string()));
		}

		let path = value.trim().strip_prefix("file:")?;
		if path.is_empty() {
			return None;
		}
		Some(Self::External(PathBuf::from(path)))
	}

	pub fn is_script(value: &str) -> bool {
		Self::parse(value).is_some()
	}

	/// Returns the script body, reading external scripts from disk.
	pub async fn load(&self) -> Result<String> {
		match self {
			Self::Inline(body) => Ok(body.clone()),
			Self::External(path) => {
				tokio::fs::read_to_string(path)
					.await
					.map_err(|source| ReleaseError::ScriptNotFound {
						path: path.clone(),
						source,
					})
			}
		}
	}

	/// Loads and runs this script with the given executor.
	#[instrument(level = "debug", skip_all, fields(script = ?self.kind()))]
	pub async fn execute(
		&self,
		executor: Option<&dyn ScriptExecutor>,
		bindings: &ScriptBindings,
	) -> Result<Value> {
		let executor = executor.ok_or(ReleaseError::ScriptExecutorUnavailable)?;
		let body = self.load().await?;
		let value = executor.execute(&body, bindings).await?;
		debug!("script executed");
		Ok(value)
	}

	fn kind(&self) -> &'static str {
		match self {
			Self::Inline(_) => "inline",
			Self::External(_) => "external",
		}
	}
}

/// Interprets a script result as a set of attributes.
///
/// `null` yields an empty set; anything other than an object is an error.
pub fn attributes_from_script(value: Value) -> Result<AttributeContainer> {
	match value {
		Value::Null => Ok(AttributeContainer::new()),
		Value::Object(_) => Ok(serde_json::from_value(value)?),
		other => Err(ReleaseError::ScriptResult {
			expected: "an object",
			found: json_kind(&other).to_string(),
		}),
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

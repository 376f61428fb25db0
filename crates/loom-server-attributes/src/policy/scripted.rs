// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use loom_attributes_core::{AttributeContainer, ReleaseContext};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::pipeline::ReleaseServices;
use crate::script::{attributes_from_script, ScriptBindings, ScriptReference};

/// Releases whatever map a single script returns.
///
/// `script` is an inline `script { ... }` block or a script location; a bare
/// location without the `file:` prefix is read as a path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedPolicy {
	#[serde(default)]
	pub script: Option<String>,
}

impl ScriptedPolicy {
	pub fn new(script: impl Into<String>) -> Self {
		Self {
			script: Some(script.into()),
		}
	}

	fn reference(&self) -> Option<ScriptReference> {
		let script = self.script.as_deref()?.trim();
		if script.is_empty() {
			return None;
		}
		Some(
			ScriptReference::parse(script)
				.unwrap_or_else(|| ScriptReference::External(PathBuf::from(script))),
		)
	}

	pub(crate) async fn compute(
		&self,
		services: &ReleaseServices,
		context: &ReleaseContext<'_>,
		resolved: &AttributeContainer,
	) -> Result<AttributeContainer> {
		let Some(reference) = self.reference() else {
			debug!(
				registered_service = context.registered_service.id,
				"no script configured; releasing nothing"
			);
			return Ok(AttributeContainer::new());
		};

		let bindings = ScriptBindings::new(resolved.clone());
		let value = reference.execute(services.script_executor(), &bindings).await?;
		attributes_from_script(value)
	}
}

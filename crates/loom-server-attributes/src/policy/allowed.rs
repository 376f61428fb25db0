// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use loom_attributes_core::{AttributeContainer, ReleaseContext};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::Result;
use crate::pipeline::ReleaseServices;
use crate::script::{attributes_from_script, ScriptBindings, ScriptReference};

/// Releases the listed attributes verbatim.
///
/// An entry may be a script reference instead of a name; the script receives
/// the resolved attributes and the request context and its returned map is
/// merged into the release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedPolicy {
	#[serde(default)]
	pub allowed_attributes: Vec<String>,
}

impl AllowedPolicy {
	pub fn new<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			allowed_attributes: names.into_iter().map(Into::into).collect(),
		}
	}

	pub(crate) fn requested_definitions(&self) -> Vec<String> {
		plain_names(&self.allowed_attributes)
	}

	pub(crate) async fn compute(
		&self,
		services: &ReleaseServices,
		context: &ReleaseContext<'_>,
		resolved: &AttributeContainer,
	) -> Result<AttributeContainer> {
		release_allowed(&self.allowed_attributes, services, context, resolved).await
	}
}

pub(crate) fn plain_names(names: &[String]) -> Vec<String> {
	names
		.iter()
		.filter(|name| !ScriptReference::is_script(name))
		.cloned()
		.collect()
}

/// Copies each allowed attribute present in `resolved`, keeping the casing it
/// was resolved under, and merges in the output of any script entries.
pub(crate) async fn release_allowed(
	names: &[String],
	services: &ReleaseServices,
	context: &ReleaseContext<'_>,
	resolved: &AttributeContainer,
) -> Result<AttributeContainer> {
	let mut released = AttributeContainer::new();

	for name in names {
		if let Some(script) = ScriptReference::parse(name) {
			let bindings = ScriptBindings::new(resolved.clone()).with_context(context.summary());
			let value = script.execute(services.script_executor(), &bindings).await?;
			released.merge(attributes_from_script(value)?);
			continue;
		}

		match (resolved.stored_name(name), resolved.get(name)) {
			(Some(stored), Some(values)) => {
				released.insert(stored, values.to_vec());
			}
			_ => trace!(attribute = %name, "allowed attribute not resolved"),
		}
	}

	Ok(released)
}

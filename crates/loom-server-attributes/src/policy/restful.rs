// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Remote attribute release.
//!
//! The resolved attributes are posted to an endpoint as a JSON object, with the
//! principal and service identifiers as `principal` and `service` query
//! parameters. A successful response body of the same shape is the release.

use indexmap::IndexMap;
use loom_attributes_core::{AttributeContainer, ReleaseContext};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::mapped::{authorize_mapped, MappedTargets};
use crate::error::{ReleaseError, Result};
use crate::pipeline::ReleaseServices;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
	Get,
	#[default]
	Post,
	Put,
	Patch,
	Delete,
}

impl HttpMethod {
	fn as_method(self) -> Method {
		match self {
			Self::Get => Method::GET,
			Self::Post => Method::POST,
			Self::Put => Method::PUT,
			Self::Patch => Method::PATCH,
			Self::Delete => Method::DELETE,
		}
	}
}

/// Delegates the release decision to a remote endpoint.
///
/// When `allowed_attributes` is set the remote answer is renamed and narrowed
/// the same way [`super::MappedPolicy`] does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestfulPolicy {
	pub endpoint: String,
	#[serde(default)]
	pub method: HttpMethod,
	#[serde(default)]
	pub headers: IndexMap<String, String>,
	#[serde(default)]
	pub allowed_attributes: IndexMap<String, MappedTargets>,
}

impl RestfulPolicy {
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			..Default::default()
		}
	}

	pub fn with_method(mut self, method: HttpMethod) -> Self {
		self.method = method;
		self
	}

	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());
		self
	}

	pub fn with_allowed_attribute(
		mut self,
		name: impl Into<String>,
		targets: impl Into<MappedTargets>,
	) -> Self {
		self.allowed_attributes.insert(name.into(), targets.into());
		self
	}

	#[instrument(level = "debug", skip_all, fields(method = ?self.method))]
	pub(crate) async fn compute(
		&self,
		services: &ReleaseServices,
		context: &ReleaseContext<'_>,
		resolved: &AttributeContainer,
	) -> Result<AttributeContainer> {
		let endpoint = services.expression_resolver().resolve(&self.endpoint);
		if endpoint.trim().is_empty() {
			return Err(ReleaseError::Config("remote release endpoint is blank".to_string()));
		}

		let mut request = services
			.http_client()
			.request(self.method.as_method(), &endpoint)
			.query(&[
				("principal", context.principal.id.as_str()),
				("service", context.service.id.as_str()),
			])
			.json(resolved);
		for (name, value) in &self.headers {
			request = request.header(name.as_str(), value.as_str());
		}

		let response = request.send().await?;
		let status = response.status();
		if !status.is_success() {
			return Err(ReleaseError::HttpStatus {
				url: endpoint,
				status: status.as_u16(),
			});
		}

		let released: AttributeContainer = response.json().await?;
		debug!(released = released.len(), "remote release received");

		if self.allowed_attributes.is_empty() {
			return Ok(released);
		}
		authorize_mapped(&self.allowed_attributes, services, &released).await
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-request release context.

use serde::Serialize;

use crate::principal::{Principal, Service};
use crate::service::RegisteredService;

/// Everything a release decision is made about: who, for which service, under
/// which registration.
///
/// Built fresh for each decision and dropped once the decision is made.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseContext<'a> {
	pub principal: &'a Principal,
	pub service: &'a Service,
	pub registered_service: &'a RegisteredService,
}

impl<'a> ReleaseContext<'a> {
	pub fn new(
		principal: &'a Principal,
		service: &'a Service,
		registered_service: &'a RegisteredService,
	) -> Self {
		Self {
			principal,
			service,
			registered_service,
		}
	}

	/// A serializable view of the identifiers in this context, suitable for
	/// logging and for handing to external collaborators.
	pub fn summary(&self) -> ContextSummary {
		ContextSummary {
			principal_id: self.principal.id.clone(),
			service_id: self.service.id.clone(),
			registered_service_id: self.registered_service.id,
			registered_service_name: self.registered_service.name.clone(),
		}
	}
}

/// Identifiers of a [`ReleaseContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSummary {
	pub principal_id: String,
	pub service_id: String,
	pub registered_service_id: i64,
	pub registered_service_name: String,
}

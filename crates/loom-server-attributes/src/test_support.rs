// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared fixtures for unit tests.

use async_trait::async_trait;
use loom_attributes_core::{
	Principal, RegisteredService, ReleaseContext, Service, UsernameAttributeProvider,
};
use serde_json::{json, Value};

use crate::error::{ReleaseError, Result};
use crate::script::{ScriptBindings, ScriptExecutor};

/// Treats the script body as a JSON literal.
pub struct JsonScriptExecutor;

#[async_trait]
impl ScriptExecutor for JsonScriptExecutor {
	async fn execute(&self, script: &str, _bindings: &ScriptBindings) -> Result<Value> {
		serde_json::from_str(script).map_err(|e| ReleaseError::Script(e.to_string()))
	}
}

/// Resolves every principal to the same username.
pub struct FixedUsername(pub &'static str);

impl UsernameAttributeProvider for FixedUsername {
	fn resolve_username(
		&self,
		_principal: &Principal,
		_service: &Service,
		_registered_service: &RegisteredService,
	) -> String {
		self.0.to_string()
	}
}

pub struct ContextFixture {
	pub principal: Principal,
	pub service: Service,
	pub registered: RegisteredService,
}

impl ContextFixture {
	pub fn context(&self) -> ReleaseContext<'_> {
		ReleaseContext::new(&self.principal, &self.service, &self.registered)
	}
}

pub fn context_fixture() -> ContextFixture {
	ContextFixture {
		principal: Principal::new("jdoe")
			.with_attribute("uid", vec![json!("jdoe")])
			.with_attribute("mail", vec![json!("jdoe@example.com")])
			.with_attribute("cn", vec![json!("Jane Doe")]),
		service: Service::new("https://app.example.com"),
		registered: RegisteredService::new(1, "app", "https://app.example.com/.*"),
	}
}

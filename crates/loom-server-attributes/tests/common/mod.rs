// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use loom_attributes_core::{Principal, RegisteredService, Service, UsernameAttributeProvider};
use loom_server_attributes::{ReleaseError, ScriptBindings, ScriptExecutor};
use serde_json::{json, Value};

pub struct Fixture {
	pub principal: Principal,
	pub service: Service,
	pub registered: RegisteredService,
}

impl Fixture {
	pub fn new() -> Self {
		Self {
			principal: Principal::new("jdoe")
				.with_attribute("uid", vec![json!("jdoe123")])
				.with_attribute("mail", vec![json!("a@x.com")])
				.with_attribute("cn", vec![json!("Jane Doe")])
				.with_attribute("dept", vec![json!("eng")]),
			service: Service::new("https://app.example.com/login"),
			registered: RegisteredService::new(42, "app", "https://app.example.com/.*"),
		}
	}

	pub fn with_username(mut self, username: &'static str) -> Self {
		self.registered = self
			.registered
			.with_username_provider(Arc::new(FixedUsername(username)));
		self
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

/// Treats the script body as a JSON literal.
pub struct JsonScriptExecutor;

#[async_trait]
impl ScriptExecutor for JsonScriptExecutor {
	async fn execute(
		&self,
		script: &str,
		_bindings: &ScriptBindings,
	) -> Result<Value, ReleaseError> {
		serde_json::from_str(script).map_err(|e| ReleaseError::Script(e.to_string()))
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Placeholder expansion for configured values.
//!
//! Static attribute values and remote endpoints may embed placeholders that
//! are expanded at release time:
//!
//! | Placeholder | Expands to |
//! |---|---|
//! | `${#environmentVars['NAME']}` | environment variable `NAME`, or empty |
//! | `${#systemProperties['NAME']}` | configured system property `NAME`, or empty |
//! | `${#localDate}` | current local date, `YYYY-MM-DD` |
//! | `${#localDateTime}` | current local date and time |
//! | `${#randomNumber}` | a random unsigned integer |
//!
//! Anything else is left untouched.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\$\{#([A-Za-z]+)(?:\['([^']*)'\])?\}").unwrap()
});

/// Expands placeholders in configured values.
#[derive(Debug, Clone, Default)]
pub struct ExpressionResolver {
	system_properties: IndexMap<String, String>,
}

impl ExpressionResolver {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_system_properties(mut self, properties: IndexMap<String, String>) -> Self {
		self.system_properties = properties;
		self
	}

	pub fn system_property(&self, name: &str) -> Option<&str> {
		self.system_properties.get(name).map(String::as_str)
	}

	pub fn system_properties(&self) -> &IndexMap<String, String> {
		&self.system_properties
	}

	/// Expands all recognized placeholders in `input`.
	pub fn resolve(&self, input: &str) -> String {
		if !input.contains("${#") {
			return input.to_string();
		}

		PLACEHOLDER
			.replace_all(input, |captures: &Captures| self.expand(captures))
			.into_owned()
	}

	fn expand(&self, captures: &Captures) -> String {
		let function = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
		let argument = captures.get(2).map(|m| m.as_str());

		match (function, argument) {
			("environmentVars", Some(name)) => std::env::var(name).unwrap_or_default(),
			("systemProperties", Some(name)) => self
				.system_property(name)
				.map(str::to_string)
				.unwrap_or_default(),
			("localDate", None) => chrono::Local::now().date_naive().to_string(),
			("localDateTime", None) => chrono::Local::now()
				.naive_local()
				.format("%Y-%m-%dT%H:%M:%S")
				.to_string(),
			("randomNumber", None) => rand::random::<u32>().to_string(),
			_ => captures[0].to_string(),
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Loom attribute release.
//!
//! This crate holds the data model shared by the release engine
//! (`loom-server-attributes`) and the components that call it:
//!
//! - [`AttributeContainer`]: ordered, case-insensitive attribute map
//! - [`Principal`] and [`Service`]: who is signing on, and to what
//! - [`RegisteredService`]: the relying party registration, with its public
//!   key, consent policy and username provider
//! - [`ReleaseContext`]: the per-request bundle of the above
//!
//! # Example
//!
//! ```
//! use loom_attributes_core::{AttributeContainer, Principal};
//! use serde_json::json;
//!
//! let principal = Principal::new("jdoe")
//!     .with_attribute("mail", vec![json!("jdoe@example.com")]);
//!
//! let mut released = AttributeContainer::new();
//! released.insert_value("Mail", "jdoe@example.com");
//! assert!(released.contains("mail"));
//! assert_eq!(principal.attributes.len(), 1);
//! ```

pub mod container;
pub mod context;
pub mod error;
pub mod principal;
pub mod service;

pub use container::{into_values, value_to_string, Attribute, AttributeContainer};
pub use context::{ContextSummary, ReleaseContext};
pub use error::{AttributesError, Result};
pub use principal::{Principal, Service};
pub use service::{
	ConsentPolicy, PublicKeySource, RegisteredService, RegisteredServicePublicKey,
	UsernameAttributeProvider, DEFAULT_PUBLIC_KEY_ALGORITHM,
};

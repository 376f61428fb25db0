// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Consent narrowing of released attributes.
//!
//! The consent view is what a consent prompt shows the user. It is derived from
//! the released set and never feeds back into what the relying party receives.

use loom_attributes_core::{AttributeContainer, ConsentPolicy};

/// Narrows `released` according to `policy`.
///
/// Excluded names are removed first; a non-empty include-only list then keeps
/// just the names it lists. Comparison is case-insensitive.
pub fn narrow(mut released: AttributeContainer, policy: Option<&ConsentPolicy>) -> AttributeContainer {
	let Some(policy) = policy else {
		return released;
	};

	for name in &policy.excluded_attributes {
		released.remove(name);
	}

	if !policy.include_only_attributes.is_empty() {
		let included: Vec<String> = policy
			.include_only_attributes
			.iter()
			.map(|name| name.to_lowercase())
			.collect();
		released.retain(|name, _| included.contains(&name.to_lowercase()));
	}

	released
}

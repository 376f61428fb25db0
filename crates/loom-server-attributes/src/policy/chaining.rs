// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use loom_attributes_core::{AttributeContainer, ReleaseContext};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::AttributeReleasePolicy;
use crate::pipeline::ReleaseEngine;

/// How member outputs combine on a name collision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergingStrategy {
	/// Later members overwrite earlier ones.
	#[default]
	Replace,
	/// Earlier members keep their values.
	Add,
	/// Values are concatenated; duplicates are dropped.
	Multivalued,
}

impl MergingStrategy {
	fn merge(self, merged: &mut AttributeContainer, released: AttributeContainer) {
		match self {
			Self::Replace => merged.merge(released),
			Self::Add => merged.merge_missing(released),
			Self::Multivalued => merged.merge_values(released),
		}
	}
}

/// Evaluates member policies independently and combines their releases in
/// list order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainingPolicy {
	#[serde(default)]
	pub policies: Vec<AttributeReleasePolicy>,
	#[serde(default)]
	pub merging_strategy: MergingStrategy,
}

impl ChainingPolicy {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_policy(mut self, policy: AttributeReleasePolicy) -> Self {
		self.add_policy(policy);
		self
	}

	pub fn with_merging_strategy(mut self, strategy: MergingStrategy) -> Self {
		self.merging_strategy = strategy;
		self
	}

	pub fn add_policy(&mut self, policy: AttributeReleasePolicy) {
		self.policies.push(policy);
	}

	pub fn size(&self) -> usize {
		self.policies.len()
	}

	pub(crate) async fn release(
		&self,
		engine: &ReleaseEngine,
		context: &ReleaseContext<'_>,
	) -> AttributeContainer {
		let mut merged = AttributeContainer::new();
		for (index, policy) in self.policies.iter().enumerate() {
			let released = engine
				.release(
					policy,
					context.principal,
					context.service,
					context.registered_service,
				)
				.await;
			trace!(member = index, released = released.len(), "chained policy released");
			self.merging_strategy.merge(&mut merged, released);
		}
		merged
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn container(entries: &[(&str, i64)]) -> AttributeContainer {
		entries
			.iter()
			.map(|(name, value)| (*name, vec![json!(value)]))
			.collect()
	}

	#[test]
	fn strategies_resolve_collisions() {
		let first = container(&[("a", 1)]);
		let second = container(&[("a", 2), ("b", 3)]);

		let mut replaced = first.clone();
		MergingStrategy::Replace.merge(&mut replaced, second.clone());
		assert_eq!(replaced.get("a"), Some(&[json!(2)][..]));

		let mut added = first.clone();
		MergingStrategy::Add.merge(&mut added, second.clone());
		assert_eq!(added.get("a"), Some(&[json!(1)][..]));
		assert_eq!(added.get("b"), Some(&[json!(3)][..]));

		let mut multivalued = first.clone();
		MergingStrategy::Multivalued.merge(&mut multivalued, second);
		assert_eq!(multivalued.get("a"), Some(&[json!(1), json!(2)][..]));
	}

	#[test]
	fn size_tracks_added_policies() {
		let mut chain = ChainingPolicy::new();
		assert_eq!(chain.size(), 0);
		chain.add_policy(AttributeReleasePolicy::return_all());
		assert_eq!(chain.size(), 1);
	}
}

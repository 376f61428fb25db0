// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The attribute container used throughout the release pipeline.
//!
//! An [`AttributeContainer`] maps attribute names to ordered value lists.
//! Names compare case-insensitively, so `Mail` and `mail` address the same
//! entry. The name stored for an entry is whichever casing was written last;
//! it is never normalized.
//!
//! Values are always a list, even when an attribute has a single value.

use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single named attribute with its values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
	pub name: String,
	pub values: Vec<Value>,
}

/// Ordered, case-insensitive mapping from attribute name to values.
///
/// Iteration follows the order in which names were first inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeContainer {
	entries: IndexMap<String, Attribute>,
}

fn fold_key(name: &str) -> String {
	name.to_lowercase()
}

impl AttributeContainer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Inserts values under `name`, replacing any entry with the same name
	/// under case-insensitive comparison. The stored casing becomes `name`.
	///
	/// Returns the previous values, if any.
	pub fn insert(&mut self, name: impl Into<String>, values: Vec<Value>) -> Option<Vec<Value>> {
		let name = name.into();
		let key = fold_key(&name);
		self
			.entries
			.insert(key, Attribute { name, values })
			.map(|previous| previous.values)
	}

	/// Inserts a single value, wrapped in a one-element list.
	pub fn insert_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.insert(name, vec![value.into()]);
	}

	/// Appends values to an existing entry, or creates it. Keeps the stored casing.
	pub fn append(&mut self, name: impl Into<String>, values: Vec<Value>) {
		let name = name.into();
		let key = fold_key(&name);
		match self.entries.get_mut(&key) {
			Some(existing) => existing.values.extend(values),
			None => {
				self.entries.insert(key, Attribute { name, values });
			}
		}
	}

	pub fn get(&self, name: &str) -> Option<&[Value]> {
		self
			.entries
			.get(&fold_key(name))
			.map(|attribute| attribute.values.as_slice())
	}

	/// Returns the stored name for `name` in its last-written casing.
	pub fn stored_name(&self, name: &str) -> Option<&str> {
		self
			.entries
			.get(&fold_key(name))
			.map(|attribute| attribute.name.as_str())
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(&fold_key(name))
	}

	/// Removes an entry, preserving the order of the remaining entries.
	pub fn remove(&mut self, name: &str) -> Option<Vec<Value>> {
		self
			.entries
			.shift_remove(&fold_key(name))
			.map(|attribute| attribute.values)
	}

	/// Keeps only the entries for which `keep` returns true.
	pub fn retain(&mut self, mut keep: impl FnMut(&str, &[Value]) -> bool) {
		self
			.entries
			.retain(|_, attribute| keep(&attribute.name, &attribute.values));
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
		self
			.entries
			.values()
			.map(|attribute| (attribute.name.as_str(), attribute.values.as_slice()))
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.values().map(|attribute| attribute.name.as_str())
	}

	/// Applies `f` to every value list in place.
	pub fn map_values(&mut self, mut f: impl FnMut(&str, &mut Vec<Value>)) {
		for attribute in self.entries.values_mut() {
			f(&attribute.name, &mut attribute.values);
		}
	}

	/// Merges `other` into `self`. Entries from `other` win on collision.
	pub fn merge(&mut self, other: AttributeContainer) {
		for (_, attribute) in other.entries {
			self.insert(attribute.name, attribute.values);
		}
	}

	/// Merges `other` into `self`, keeping existing entries on collision.
	pub fn merge_missing(&mut self, other: AttributeContainer) {
		for (key, attribute) in other.entries {
			self.entries.entry(key).or_insert(attribute);
		}
	}

	/// Merges `other` into `self`, concatenating values on collision and
	/// dropping values already present for that attribute.
	pub fn merge_values(&mut self, other: AttributeContainer) {
		for (key, attribute) in other.entries {
			match self.entries.get_mut(&key) {
				Some(existing) => {
					for value in attribute.values {
						if !existing.values.contains(&value) {
							existing.values.push(value);
						}
					}
				}
				None => {
					self.entries.insert(key, attribute);
				}
			}
		}
	}
}

impl IntoIterator for AttributeContainer {
	type Item = (String, Vec<Value>);
	type IntoIter = std::iter::Map<
		indexmap::map::IntoIter<String, Attribute>,
		fn((String, Attribute)) -> (String, Vec<Value>),
	>;

	fn into_iter(self) -> Self::IntoIter {
		self
			.entries
			.into_iter()
			.map(into_pair as fn((String, Attribute)) -> (String, Vec<Value>))
	}
}

fn into_pair((_, attribute): (String, Attribute)) -> (String, Vec<Value>) {
	(attribute.name, attribute.values)
}

impl<K: Into<String>> FromIterator<(K, Vec<Value>)> for AttributeContainer {
	fn from_iter<I: IntoIterator<Item = (K, Vec<Value>)>>(iter: I) -> Self {
		let mut container = AttributeContainer::new();
		for (name, values) in iter {
			container.insert(name, values);
		}
		container
	}
}

impl Serialize for AttributeContainer {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_map(self.iter())
	}
}

impl<'de> Deserialize<'de> for AttributeContainer {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
		Ok(raw
			.into_iter()
			.map(|(name, value)| (name, into_values(value)))
			.collect())
	}
}

/// Wraps a JSON value into a value list. Arrays are taken as-is, `null`
/// becomes an empty list, and anything else becomes a single element.
pub fn into_values(value: Value) -> Vec<Value> {
	match value {
		Value::Array(values) => values,
		Value::Null => Vec::new(),
		other => vec![other],
	}
}

/// Renders a value as plain text. Strings are returned without quotes.
pub fn value_to_string(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flat, insertion-ordered property bag for Tracks events.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A scalar property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
}

impl PropertyValue {
	/// Coerces a JSON value into a scalar.
	///
	/// Arrays and objects are stringified to compact JSON so the resulting map
	/// stays flat. Unsigned integers beyond `i64::MAX` become strings.
	pub fn from_json(value: Value) -> Self {
		match value {
			Value::Null => PropertyValue::Null,
			Value::Bool(b) => PropertyValue::Bool(b),
			Value::Number(n) => {
				if let Some(i) = n.as_i64() {
					PropertyValue::Int(i)
				} else if n.is_u64() {
					PropertyValue::String(n.to_string())
				} else {
					n.as_f64()
						.map(PropertyValue::Float)
						.unwrap_or_else(|| PropertyValue::String(n.to_string()))
				}
			}
			Value::String(s) => PropertyValue::String(s),
			nested @ (Value::Array(_) | Value::Object(_)) => PropertyValue::String(nested.to_string()),
		}
	}

	/// Renders the value for a query string.
	///
	/// Returns `None` for values that are omitted from the pixel (null and
	/// non-finite floats). Booleans render as `1`/`0` and floats never use
	/// exponent notation.
	pub fn to_query_value(&self) -> Option<String> {
		match self {
			PropertyValue::Null => None,
			PropertyValue::Bool(true) => Some("1".to_string()),
			PropertyValue::Bool(false) => Some("0".to_string()),
			PropertyValue::Int(i) => Some(i.to_string()),
			PropertyValue::Float(f) if f.is_finite() => Some(f.to_string()),
			PropertyValue::Float(_) => None,
			PropertyValue::String(s) => Some(s.clone()),
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			PropertyValue::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, PropertyValue::Null)
	}
}

impl From<&str> for PropertyValue {
	fn from(value: &str) -> Self {
		PropertyValue::String(value.to_string())
	}
}

impl From<String> for PropertyValue {
	fn from(value: String) -> Self {
		PropertyValue::String(value)
	}
}

impl From<bool> for PropertyValue {
	fn from(value: bool) -> Self {
		PropertyValue::Bool(value)
	}
}

impl From<i32> for PropertyValue {
	fn from(value: i32) -> Self {
		PropertyValue::Int(value.into())
	}
}

impl From<i64> for PropertyValue {
	fn from(value: i64) -> Self {
		PropertyValue::Int(value)
	}
}

impl From<u32> for PropertyValue {
	fn from(value: u32) -> Self {
		PropertyValue::Int(value.into())
	}
}

impl From<u64> for PropertyValue {
	fn from(value: u64) -> Self {
		i64::try_from(value)
			.map(PropertyValue::Int)
			.unwrap_or_else(|_| PropertyValue::String(value.to_string()))
	}
}

impl From<f64> for PropertyValue {
	fn from(value: f64) -> Self {
		PropertyValue::Float(value)
	}
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
	fn from(value: Option<T>) -> Self {
		value.map(Into::into).unwrap_or(PropertyValue::Null)
	}
}

impl From<Value> for PropertyValue {
	fn from(value: Value) -> Self {
		PropertyValue::from_json(value)
	}
}

/// An insertion-ordered map from key to [`PropertyValue`].
///
/// Re-inserting an existing key replaces its value but keeps its position, so
/// the query string order reflects when a key was first contributed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
	entries: Vec<(String, PropertyValue)>,
}

impl PropertyMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a value, returning the previous one for the key if any.
	pub fn insert(
		&mut self,
		key: impl Into<String>,
		value: impl Into<PropertyValue>,
	) -> Option<PropertyValue> {
		let key = key.into();
		let value = value.into();
		match self.entries.iter_mut().find(|(k, _)| *k == key) {
			Some((_, existing)) => Some(std::mem::replace(existing, value)),
			None => {
				self.entries.push((key, value));
				None
			}
		}
	}

	/// Builder-style insert.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
		self.insert(key, value);
		self
	}

	pub fn get(&self, key: &str) -> Option<&PropertyValue> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.entries.iter().any(|(k, _)| k == key)
	}

	/// Merges `other` into this map. Values from `other` win.
	pub fn merge(&mut self, other: PropertyMap) {
		for (k, v) in other.entries {
			self.insert(k, v);
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(|(k, _)| k.as_str())
	}
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyMap {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut map = PropertyMap::new();
		for (k, v) in iter {
			map.insert(k, v);
		}
		map
	}
}

impl IntoIterator for PropertyMap {
	type Item = (String, PropertyValue);
	type IntoIter = std::vec::IntoIter<(String, PropertyValue)>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}

impl Serialize for PropertyMap {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.entries.len()))?;
		for (k, v) in &self.entries {
			map.serialize_entry(k, v)?;
		}
		map.end()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;

	#[test]
	fn insert_keeps_first_position() {
		let mut map = PropertyMap::new().with("a", 1).with("b", 2);
		let old = map.insert("a", 10);

		assert_eq!(old, Some(PropertyValue::Int(1)));
		assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
		assert_eq!(map.get("a"), Some(&PropertyValue::Int(10)));
	}

	#[test]
	fn merge_later_wins() {
		let mut base = PropertyMap::new().with("a", "x").with("b", "y");
		base.merge(PropertyMap::new().with("b", "z").with("c", true));

		assert_eq!(base.len(), 3);
		assert_eq!(base.get("b"), Some(&PropertyValue::from("z")));
		assert_eq!(base.get("c"), Some(&PropertyValue::Bool(true)));
	}

	#[test]
	fn nested_json_is_stringified() {
		let value = PropertyValue::from_json(json!({"sku": "abc", "qty": [1, 2]}));
		assert_eq!(value, PropertyValue::String(r#"{"qty":[1,2],"sku":"abc"}"#.to_string()));
	}

	#[test]
	fn large_unsigned_becomes_string() {
		let value = PropertyValue::from(u64::MAX);
		assert_eq!(value, PropertyValue::String(u64::MAX.to_string()));
	}

	#[test]
	fn query_values() {
		assert_eq!(PropertyValue::Null.to_query_value(), None);
		assert_eq!(PropertyValue::Bool(true).to_query_value().as_deref(), Some("1"));
		assert_eq!(PropertyValue::Bool(false).to_query_value().as_deref(), Some("0"));
		assert_eq!(PropertyValue::Int(42).to_query_value().as_deref(), Some("42"));
		assert_eq!(PropertyValue::Float(f64::NAN).to_query_value(), None);
	}

	#[test]
	fn large_float_has_no_exponent() {
		let rendered = PropertyValue::Float(1.5e20).to_query_value().unwrap();
		assert!(!rendered.contains('e'), "{rendered}");
		assert_eq!(rendered, "150000000000000000000");
	}

	#[test]
	fn option_none_is_null() {
		let value: PropertyValue = Option::<i64>::None.into();
		assert!(value.is_null());
	}

	#[test]
	fn serializes_in_insertion_order() {
		let map = PropertyMap::new().with("z", 1).with("a", "b");
		assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"z":1,"a":"b"}"#);
	}

	proptest! {
		#[test]
		fn len_matches_unique_keys(keys in proptest::collection::vec("[a-z]{1,8}", 0..20)) {
			let unique: std::collections::HashSet<_> = keys.iter().cloned().collect();
			let map: PropertyMap = keys.iter().map(|k| (k.clone(), "v")).collect();
			prop_assert_eq!(map.len(), unique.len());
		}

		#[test]
		fn ints_render_as_plain_decimal(n in any::<i64>()) {
			let rendered = PropertyValue::Int(n).to_query_value().unwrap();
			prop_assert_eq!(rendered.parse::<i64>().unwrap(), n);
		}
	}
}

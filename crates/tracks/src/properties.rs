// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helper for building caller-supplied event properties.

use serde_json::{Map, Value};
use tracks_core::{PropertyMap, PropertyValue};

/// A builder for caller-supplied event properties.
///
/// Values may be any JSON value. Arrays and objects are stringified on insert
/// so the result is always a flat map of scalars.
///
/// # Example
///
/// ```
/// use tracks::Properties;
///
/// let props = Properties::new()
///     .insert("product_id", 42)
///     .insert("product_type", "simple")
///     .insert("price", 19.99)
///     .insert("is_virtual", false);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
	inner: PropertyMap,
}

impl Properties {
	/// Creates a new empty Properties builder.
	pub fn new() -> Self {
		Self {
			inner: PropertyMap::new(),
		}
	}

	/// Inserts a key-value pair into the properties.
	pub fn insert<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.inner
			.insert(key, PropertyValue::from_json(value.into()));
		self
	}

	/// Merges another Properties into this one.
	///
	/// If both contain the same key, the value from `other` takes precedence.
	pub fn merge(mut self, other: Properties) -> Self {
		self.inner.merge(other.inner);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn get(&self, key: &str) -> Option<&PropertyValue> {
		self.inner.get(key)
	}

	/// Converts the properties into a flat [`PropertyMap`].
	pub fn into_map(self) -> PropertyMap {
		self.inner
	}
}

impl From<Properties> for PropertyMap {
	fn from(props: Properties) -> Self {
		props.into_map()
	}
}

impl From<PropertyMap> for Properties {
	fn from(map: PropertyMap) -> Self {
		Self { inner: map }
	}
}

impl From<Value> for Properties {
	fn from(value: Value) -> Self {
		match value {
			Value::Object(map) => Self::from(map),
			_ => Self::new(),
		}
	}
}

impl From<Map<String, Value>> for Properties {
	fn from(map: Map<String, Value>) -> Self {
		map.into_iter()
			.fold(Self::new(), |props, (k, v)| props.insert(k, v))
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The event value handed from assembly to encoding.

use chrono::Utc;
use serde::Serialize;

use crate::error::{Result, ValidationError};
use crate::keys;
use crate::property::{PropertyMap, PropertyValue};

/// A fully assembled event.
///
/// Construction stamps `_en` and `_ts` into the properties, so the name and
/// timestamp fields always agree with what gets encoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
	name: String,
	properties: PropertyMap,
	timestamp_ms: i64,
}

impl Event {
	pub fn new(name: impl Into<String>, mut properties: PropertyMap, timestamp_ms: i64) -> Self {
		let name = name.into();
		properties.insert(keys::EVENT_NAME, name.clone());
		properties.insert(keys::TIMESTAMP, format_timestamp(timestamp_ms));
		Self {
			name,
			properties,
			timestamp_ms,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn properties(&self) -> &PropertyMap {
		&self.properties
	}

	pub fn timestamp_ms(&self) -> i64 {
		self.timestamp_ms
	}

	/// Looks up a string property.
	pub fn property_str(&self, key: &str) -> Option<&str> {
		self.properties.get(key).and_then(PropertyValue::as_str)
	}
}

/// Milliseconds since the Unix epoch.
pub fn timestamp_ms_now() -> i64 {
	Utc::now().timestamp_millis()
}

/// Formats a millisecond timestamp as a plain decimal string.
pub fn format_timestamp(timestamp_ms: i64) -> String {
	timestamp_ms.to_string()
}

/// Event names are lowercase snake case: `[a-z][a-z0-9_]*`.
pub fn validate_event_name(name: &str) -> Result<()> {
	let mut bytes = name.bytes();
	let valid = matches!(bytes.next(), Some(b'a'..=b'z'))
		&& bytes.all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_'));
	if valid {
		Ok(())
	} else {
		Err(ValidationError::InvalidEventName(name.to_string()))
	}
}

/// Property keys are lowercase snake case and may carry the reserved `_` prefix:
/// `[a-z_][a-z0-9_]*`.
pub fn validate_property_key(key: &str) -> Result<()> {
	let mut bytes = key.bytes();
	let valid = matches!(bytes.next(), Some(b'a'..=b'z' | b'_'))
		&& bytes.all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_'));
	if valid {
		Ok(())
	} else {
		Err(ValidationError::InvalidPropertyKey(key.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn new_stamps_system_fields() {
		let event = Event::new("update_product", PropertyMap::new().with("product_id", 42), 1_700_000_000_123);

		assert_eq!(event.property_str(keys::EVENT_NAME), Some("update_product"));
		assert_eq!(event.property_str(keys::TIMESTAMP), Some("1700000000123"));
		assert_eq!(event.properties().get("product_id"), Some(&PropertyValue::Int(42)));
	}

	#[test]
	fn new_overrides_stale_system_fields() {
		let props = PropertyMap::new().with(keys::EVENT_NAME, "hack").with(keys::TIMESTAMP, "0");
		let event = Event::new("real_event", props, 5);

		assert_eq!(event.property_str(keys::EVENT_NAME), Some("real_event"));
		assert_eq!(event.property_str(keys::TIMESTAMP), Some("5"));
	}

	#[test]
	fn timestamp_now_is_milliseconds() {
		// Anything after 2020 in milliseconds has 13 digits.
		assert_eq!(format_timestamp(timestamp_ms_now()).len(), 13);
	}

	#[test]
	fn event_name_validation() {
		assert!(validate_event_name("update_product").is_ok());
		assert!(validate_event_name("wca_test_update_product").is_ok());
		assert!(validate_event_name("").is_err());
		assert!(validate_event_name("_hidden").is_err());
		assert!(validate_event_name("Update").is_err());
		assert!(validate_event_name("has space").is_err());
	}

	#[test]
	fn property_key_validation() {
		assert!(validate_property_key("product_id").is_ok());
		assert!(validate_property_key("_via_ua").is_ok());
		assert!(validate_property_key("_").is_ok());
		assert!(validate_property_key("").is_err());
		assert!(validate_property_key("ProductId").is_err());
		assert!(validate_property_key("product-id").is_err());
	}

	proptest! {
		#[test]
		fn snake_case_names_are_valid(name in "[a-z][a-z0-9_]{0,30}") {
			prop_assert!(validate_event_name(&name).is_ok());
			prop_assert!(validate_property_key(&name).is_ok());
		}

		#[test]
		fn timestamps_format_without_grouping(ts in 0i64..=i64::MAX) {
			let formatted = format_timestamp(ts);
			prop_assert!(formatted.bytes().all(|b| b.is_ascii_digit()));
		}
	}
}

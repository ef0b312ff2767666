// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracking behaviour configuration section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackingConfigLayer {
	pub allow_tracking: Option<bool>,
	pub event_prefix: Option<String>,
	pub surface_encoding_errors: Option<bool>,
}

impl TrackingConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.allow_tracking.is_some() {
			self.allow_tracking = other.allow_tracking;
		}
		if other.event_prefix.is_some() {
			self.event_prefix = other.event_prefix;
		}
		if other.surface_encoding_errors.is_some() {
			self.surface_encoding_errors = other.surface_encoding_errors;
		}
	}

	pub fn finalize(self) -> TrackingConfig {
		TrackingConfig {
			allow_tracking: self.allow_tracking.unwrap_or(false),
			event_prefix: self.event_prefix.unwrap_or_else(|| "wca_test_".to_string()),
			surface_encoding_errors: self.surface_encoding_errors.unwrap_or(false),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingConfig {
	/// Site owner's opt-in. Nothing is sent while false.
	pub allow_tracking: bool,
	pub event_prefix: String,
	pub surface_encoding_errors: bool,
}

impl Default for TrackingConfig {
	fn default() -> Self {
		TrackingConfigLayer::default().finalize()
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity store configuration.

use serde::{Deserialize, Serialize};

/// Identity store configuration (runtime, fully resolved).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
	pub database_url: String,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			database_url: "sqlite:./tracks.db".to_string(),
		}
	}
}

/// Identity store configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfigLayer {
	#[serde(default)]
	pub database_url: Option<String>,
}

impl StoreConfigLayer {
	pub fn merge(&mut self, other: StoreConfigLayer) {
		if other.database_url.is_some() {
			self.database_url = other.database_url;
		}
	}

	pub fn finalize(self) -> StoreConfig {
		StoreConfig {
			database_url: self
				.database_url
				.unwrap_or_else(|| StoreConfig::default().database_url),
		}
	}
}

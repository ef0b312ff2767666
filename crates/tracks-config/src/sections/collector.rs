// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collector (pixel endpoint) configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_ENDPOINT: &str = "https://pixel.wp.com/t.gif";
const DEFAULT_TIMEOUT_MS: u64 = 1000;
const DEFAULT_MAX_REDIRECTS: usize = 2;
const DEFAULT_MAX_URL_LENGTH: usize = 8000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollectorConfigLayer {
	pub endpoint: Option<String>,
	pub timeout_ms: Option<u64>,
	pub max_redirects: Option<usize>,
	pub max_url_length: Option<usize>,
	pub user_agent: Option<String>,
}

impl CollectorConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.timeout_ms.is_some() {
			self.timeout_ms = other.timeout_ms;
		}
		if other.max_redirects.is_some() {
			self.max_redirects = other.max_redirects;
		}
		if other.max_url_length.is_some() {
			self.max_url_length = other.max_url_length;
		}
		if other.user_agent.is_some() {
			self.user_agent = other.user_agent;
		}
	}

	pub fn finalize(self) -> CollectorConfig {
		CollectorConfig {
			endpoint: self
				.endpoint
				.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
			timeout_ms: self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
			max_redirects: self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS),
			max_url_length: self.max_url_length.unwrap_or(DEFAULT_MAX_URL_LENGTH),
			user_agent: self.user_agent,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectorConfig {
	pub endpoint: String,
	pub timeout_ms: u64,
	pub max_redirects: usize,
	pub max_url_length: usize,
	/// Overrides the standard client User-Agent when set.
	pub user_agent: Option<String>,
}

impl CollectorConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}
}

impl Default for CollectorConfig {
	fn default() -> Self {
		CollectorConfigLayer::default().finalize()
	}
}

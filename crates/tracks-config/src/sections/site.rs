// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Site identity configuration section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SiteConfigLayer {
	pub url: Option<String>,
	pub language: Option<String>,
	pub blog_id: Option<i64>,
}

impl SiteConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.language.is_some() {
			self.language = other.language;
		}
		if other.blog_id.is_some() {
			self.blog_id = other.blog_id;
		}
	}

	pub fn finalize(self) -> SiteConfig {
		SiteConfig {
			url: self.url.unwrap_or_default(),
			language: self.language.unwrap_or_else(|| "en_US".to_string()),
			blog_id: self.blog_id,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteConfig {
	pub url: String,
	pub language: String,
	pub blog_id: Option<i64>,
}

impl Default for SiteConfig {
	fn default() -> Self {
		SiteConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = SiteConfig::default();
		assert_eq!(config.url, "");
		assert_eq!(config.language, "en_US");
		assert!(config.blog_id.is_none());
	}

	#[test]
	fn test_merge_preserves_base_when_none() {
		let mut base = SiteConfigLayer {
			blog_id: Some(42),
			..Default::default()
		};
		base.merge(SiteConfigLayer {
			url: Some("https://shop.example".to_string()),
			..Default::default()
		});
		assert_eq!(base.blog_id, Some(42));
		assert_eq!(base.url.as_deref(), Some("https://shop.example"));
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for Tracks.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML config file (`/etc/tracks/config.toml` unless a path is given)
//! 3. Environment variables (`TRACKS_*`)
//!
//! # Usage
//!
//! ```ignore
//! use tracks_config::load_config;
//!
//! let config = load_config()?;
//! println!("Sending pixels to {}", config.collector.endpoint);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::TracksConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};
use url::Url;

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TracksConfig {
	pub collector: CollectorConfig,
	pub tracking: TrackingConfig,
	pub site: SiteConfig,
	pub store: StoreConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from defaults, the system config file and the environment.
pub fn load_config() -> Result<TracksConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<TracksConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<TracksConfig, ConfigError> {
	load_from_sources(vec![Box::new(EnvSource)])
}

/// Merges `sources` in precedence order and resolves the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<TracksConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = TracksConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize a merged layer into resolved config.
pub fn finalize(layer: TracksConfigLayer) -> Result<TracksConfig, ConfigError> {
	let config = TracksConfig {
		collector: layer.collector.unwrap_or_default().finalize(),
		tracking: layer.tracking.unwrap_or_default().finalize(),
		site: layer.site.unwrap_or_default().finalize(),
		store: layer.store.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		endpoint = %config.collector.endpoint,
		timeout_ms = config.collector.timeout_ms,
		allow_tracking = config.tracking.allow_tracking,
		event_prefix = %config.tracking.event_prefix,
		site_url = %config.site.url,
		database = %config.store.database_url,
		"Tracks configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &TracksConfig) -> Result<(), ConfigError> {
	let endpoint = &config.collector.endpoint;
	let url = Url::parse(endpoint).map_err(|e| ConfigError::InvalidValue {
		key: "collector.endpoint".to_string(),
		message: format!("'{endpoint}' is not a URL: {e}"),
	})?;
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::InvalidValue {
			key: "collector.endpoint".to_string(),
			message: format!("'{endpoint}' must use http or https"),
		});
	}

	let prefix = &config.tracking.event_prefix;
	if !is_valid_event_prefix(prefix) {
		return Err(ConfigError::InvalidValue {
			key: "tracking.event_prefix".to_string(),
			message: format!("'{prefix}' must be empty or match [a-z][a-z0-9_]*"),
		});
	}

	if config.collector.timeout_ms == 0 {
		return Err(ConfigError::Validation(
			"collector.timeout_ms must be greater than zero".to_string(),
		));
	}

	Ok(())
}

/// Prefixes are prepended to event names, so a non-empty one must itself be a
/// valid event name.
fn is_valid_event_prefix(prefix: &str) -> bool {
	let mut bytes = prefix.bytes();
	match bytes.next() {
		None => true,
		Some(first) => {
			first.is_ascii_lowercase()
				&& bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::io::Write;

	struct FixedSource(Precedence, TracksConfigLayer);

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.0
		}

		fn load(&self) -> Result<TracksConfigLayer, ConfigError> {
			Ok(self.1.clone())
		}
	}

	fn tracking(allow: bool) -> TracksConfigLayer {
		TracksConfigLayer {
			tracking: Some(TrackingConfigLayer {
				allow_tracking: Some(allow),
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_defaults_are_valid() {
		let config = finalize(TracksConfigLayer::default()).unwrap();
		assert_eq!(config, TracksConfig::default());
	}

	#[test]
	fn test_higher_precedence_wins_regardless_of_order() {
		let config = load_from_sources(vec![
			Box::new(FixedSource(Precedence::Environment, tracking(true))),
			Box::new(FixedSource(Precedence::ConfigFile, tracking(false))),
		])
		.unwrap();

		assert!(config.tracking.allow_tracking);
	}

	#[test]
	fn test_file_values_are_used() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[collector]
endpoint = "http://127.0.0.1:9000/t.gif"

[store]
database_url = "sqlite:/tmp/tracks-test.db"
"#
		)
		.unwrap();

		let config = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		])
		.unwrap();

		assert_eq!(config.collector.endpoint, "http://127.0.0.1:9000/t.gif");
		assert_eq!(config.store.database_url, "sqlite:/tmp/tracks-test.db");
		assert_eq!(config.collector.timeout_ms, 1000);
	}

	#[test]
	fn test_rejects_non_http_endpoint() {
		let layer = TracksConfigLayer {
			collector: Some(CollectorConfigLayer {
				endpoint: Some("ftp://pixel.example/t.gif".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(matches!(finalize(layer), Err(ConfigError::InvalidValue { .. })));
	}

	#[test]
	fn test_rejects_malformed_event_prefix() {
		for prefix in ["WC-", "wca-test_", "1_", "_wca"] {
			let layer = TracksConfigLayer {
				tracking: Some(TrackingConfigLayer {
					event_prefix: Some(prefix.to_string()),
					..Default::default()
				}),
				..Default::default()
			};
			assert!(
				matches!(finalize(layer), Err(ConfigError::InvalidValue { ref key, .. }) if key == "tracking.event_prefix"),
				"{prefix} should be rejected"
			);
		}
	}

	#[test]
	fn test_accepts_empty_and_snake_case_prefixes() {
		for prefix in ["", "wca_test_", "woo2_"] {
			let layer = TracksConfigLayer {
				tracking: Some(TrackingConfigLayer {
					event_prefix: Some(prefix.to_string()),
					..Default::default()
				}),
				..Default::default()
			};
			assert_eq!(finalize(layer).unwrap().tracking.event_prefix, prefix);
		}
	}

	#[test]
	fn test_rejects_zero_timeout() {
		let layer = TracksConfigLayer {
			collector: Some(CollectorConfigLayer {
				timeout_ms: Some(0),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	proptest! {
		#[test]
		fn nonzero_timeouts_are_accepted(timeout_ms in 1u64..600_000) {
			let layer = TracksConfigLayer {
				collector: Some(CollectorConfigLayer {
					timeout_ms: Some(timeout_ms),
					..Default::default()
				}),
				..Default::default()
			};
			prop_assert_eq!(finalize(layer).unwrap().collector.timeout_ms, timeout_ms);
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::TracksConfigLayer;
use crate::sections::{
	CollectorConfigLayer, LoggingConfigLayer, SiteConfigLayer, StoreConfigLayer,
	TrackingConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<TracksConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<TracksConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(TracksConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/tracks/config.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<TracksConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(TracksConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: TracksConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: TRACKS_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<TracksConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(TracksConfigLayer {
			collector: Some(load_collector_from_env()?),
			tracking: Some(load_tracking_from_env()),
			site: Some(load_site_from_env()?),
			store: Some(StoreConfigLayer {
				database_url: env_var("TRACKS_DATABASE_URL"),
			}),
			logging: Some(LoggingConfigLayer {
				level: env_var("TRACKS_LOG_LEVEL"),
			}),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: std::str::FromStr>(name: &str, type_name: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {type_name} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_collector_from_env() -> Result<CollectorConfigLayer, ConfigError> {
	Ok(CollectorConfigLayer {
		endpoint: env_var("TRACKS_COLLECTOR_ENDPOINT"),
		timeout_ms: env_parse("TRACKS_COLLECTOR_TIMEOUT_MS", "u64")?,
		max_redirects: env_parse("TRACKS_COLLECTOR_MAX_REDIRECTS", "usize")?,
		max_url_length: env_parse("TRACKS_COLLECTOR_MAX_URL_LENGTH", "usize")?,
		user_agent: env_var("TRACKS_COLLECTOR_USER_AGENT"),
	})
}

fn load_tracking_from_env() -> TrackingConfigLayer {
	TrackingConfigLayer {
		allow_tracking: env_bool("TRACKS_ALLOW_TRACKING"),
		// Empty is a valid prefix.
		event_prefix: std::env::var("TRACKS_EVENT_PREFIX").ok(),
		surface_encoding_errors: env_bool("TRACKS_SURFACE_ENCODING_ERRORS"),
	}
}

fn load_site_from_env() -> Result<SiteConfigLayer, ConfigError> {
	Ok(SiteConfigLayer {
		url: env_var("TRACKS_SITE_URL"),
		language: env_var("TRACKS_SITE_LANGUAGE"),
		blog_id: env_parse("TRACKS_SITE_BLOG_ID", "i64")?,
	})
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracks command-line tool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracks::{Principal, Properties, RequestContext, SiteContext, Subscriptions, Tracker};
use tracks_config::TracksConfig;
use tracks_store_sqlite::SqliteIdentityStore;

mod version;

/// Record and preview Tracks usage events.
#[derive(Parser, Debug)]
#[command(name = "tracks", about = "Record and preview Tracks usage events", version)]
struct Args {
	/// Path to a TOML config file (defaults to /etc/tracks/config.toml)
	#[arg(long, global = true, env = "TRACKS_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Record a single event
	Record {
		/// Event name without the configured prefix, e.g. `update_product`
		event: String,

		#[command(flatten)]
		principal: PrincipalArgs,

		/// Event property as key=value; values are parsed as JSON when possible
		#[arg(long = "prop", value_name = "KEY=VALUE")]
		props: Vec<String>,

		/// Print the pixel URL instead of sending it
		#[arg(long)]
		dry_run: bool,
	},

	/// Dispatch a host lifecycle event (e.g. `edit_post`) to the built-in subscribers
	Dispatch {
		/// Lifecycle event name
		lifecycle_event: String,

		#[command(flatten)]
		principal: PrincipalArgs,

		/// JSON payload, e.g. '{"post_id": 12, "post_type": "product"}'
		#[arg(long, default_value = "{}")]
		payload: String,
	},

	/// Show version and build information
	Version,
}

#[derive(clap::Args, Debug)]
struct PrincipalArgs {
	/// Principal (user) id the event is recorded for
	#[arg(long)]
	principal: String,

	/// Principal locale, reported as blog_lang
	#[arg(long)]
	locale: Option<String>,

	/// Existing anonymous token from the client's tk_ai cookie
	#[arg(long)]
	anon_cookie: Option<String>,
}

impl PrincipalArgs {
	fn into_context(self) -> RequestContext {
		let mut principal = Principal::new(self.principal);
		if let Some(locale) = self.locale {
			principal = principal.with_locale(locale);
		}

		let ctx = RequestContext::new(principal);
		match self.anon_cookie {
			Some(cookie) => ctx.with_anon_cookie(cookie),
			None => ctx,
		}
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	match args.command {
		Command::Version => {
			println!("{}", version::format_version_info());
		}
		Command::Record {
			event,
			principal,
			props,
			dry_run,
		} => {
			let properties = parse_props(&props)?;
			let tracker = startup(args.config.as_deref()).await?;
			let ctx = principal.into_context();

			if dry_run {
				let preview = tracker.preview_event(&ctx, &event, properties).await?;
				info!(event = preview.event.name(), url_length = preview.url.as_str().len(), "previewed event");
				println!("{}", preview.url);
				return Ok(());
			}

			let outcome = tracker.record_event(&ctx, &event, properties).await?;
			if outcome.is_delivered() {
				info!(event = %event, "event delivered");
			} else {
				warn!(event = %event, outcome = ?outcome, "event not delivered");
			}
			println!("{}", serde_json::to_string_pretty(&outcome)?);
		}
		Command::Dispatch {
			lifecycle_event,
			principal,
			payload,
		} => {
			let payload: Value =
				serde_json::from_str(&payload).context("payload must be valid JSON")?;
			let subscriptions = Subscriptions::with_defaults(startup(args.config.as_deref()).await?);
			if subscriptions.subscriber_count(&lifecycle_event) == 0 {
				bail!("no subscribers registered for '{lifecycle_event}'");
			}

			let outcomes = subscriptions
				.dispatch(&lifecycle_event, &principal.into_context(), &payload)
				.await;
			info!(
				lifecycle_event = %lifecycle_event,
				recorded = outcomes.len(),
				delivered = outcomes.iter().filter(|o| o.is_delivered()).count(),
				"lifecycle event dispatched"
			);
			println!("{}", serde_json::to_string_pretty(&outcomes)?);
		}
	}

	Ok(())
}

/// Loads config, installs logging, opens the identity store and builds the tracker.
async fn startup(config_path: Option<&Path>) -> anyhow::Result<Tracker> {
	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match config_path {
		Some(path) => tracks_config::load_config_with_file(path),
		None => tracks_config::load_config(),
	}
	.context("failed to load configuration")?;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	info!(version = env!("CARGO_PKG_VERSION"), "starting tracks");

	let store = SqliteIdentityStore::connect(&config.store.database_url)
		.await
		.with_context(|| format!("failed to open identity store {}", config.store.database_url))?;
	info!(database = %config.store.database_url, "identity store opened");

	build_tracker(&config, store)
}

fn build_tracker(config: &TracksConfig, store: SqliteIdentityStore) -> anyhow::Result<Tracker> {
	let mut builder = Tracker::builder()
		.endpoint(&config.collector.endpoint)
		.request_timeout(config.collector.timeout())
		.max_redirects(config.collector.max_redirects)
		.max_url_length(config.collector.max_url_length)
		.event_prefix(&config.tracking.event_prefix)
		.allow_tracking(config.tracking.allow_tracking)
		.surface_encoding_errors(config.tracking.surface_encoding_errors)
		.site(SiteContext {
			url: config.site.url.clone(),
			language: config.site.language.clone(),
			blog_id: config.site.blog_id,
		})
		.identity_store(Arc::new(store));

	if let Some(user_agent) = &config.collector.user_agent {
		builder = builder.user_agent(user_agent);
	}

	builder.build().context("failed to build tracker")
}

/// Parses `key=value` pairs. Values that parse as JSON keep their type.
fn parse_props(raw: &[String]) -> anyhow::Result<Properties> {
	raw.iter().try_fold(Properties::new(), |props, pair| {
		let Some((key, value)) = pair.split_once('=') else {
			bail!("property '{pair}' must be in key=value form");
		};
		if key.is_empty() {
			bail!("property '{pair}' has an empty key");
		}
		let value = serde_json::from_str::<Value>(value)
			.unwrap_or_else(|_| Value::String(value.to_string()));
		Ok(props.insert(key, value))
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracks::PropertyValue;

	#[test]
	fn parse_props_keeps_json_types() {
		let props = parse_props(&[
			"product_id=42".to_string(),
			"virtual=true".to_string(),
			"title=Blue Mug".to_string(),
			"price=19.5".to_string(),
		])
		.unwrap();

		assert_eq!(props.get("product_id"), Some(&PropertyValue::Int(42)));
		assert_eq!(props.get("virtual"), Some(&PropertyValue::Bool(true)));
		assert_eq!(props.get("title"), Some(&PropertyValue::from("Blue Mug")));
		assert_eq!(props.get("price"), Some(&PropertyValue::Float(19.5)));
	}

	#[test]
	fn parse_props_splits_on_first_equals() {
		let props = parse_props(&["query=a=b".to_string()]).unwrap();
		assert_eq!(props.get("query"), Some(&PropertyValue::from("a=b")));
	}

	#[test]
	fn parse_props_rejects_malformed_pairs() {
		assert!(parse_props(&["no_equals".to_string()]).is_err());
		assert!(parse_props(&["=value".to_string()]).is_err());
	}

	#[test]
	fn args_parse_record_command() {
		let args = Args::try_parse_from([
			"tracks",
			"record",
			"update_product",
			"--principal",
			"7",
			"--prop",
			"product_id=42",
			"--dry-run",
		])
		.unwrap();

		match args.command {
			Command::Record {
				event,
				principal,
				props,
				dry_run,
			} => {
				assert_eq!(event, "update_product");
				assert_eq!(principal.principal, "7");
				assert_eq!(props, vec!["product_id=42".to_string()]);
				assert!(dry_run);
			}
			other => panic!("unexpected command {other:?}"),
		}
	}

	#[tokio::test]
	async fn build_tracker_applies_config() {
		let store = SqliteIdentityStore::connect("sqlite::memory:").await.unwrap();
		let mut config = TracksConfig::default();
		config.collector.endpoint = "http://127.0.0.1:9/t.gif".to_string();

		let tracker = build_tracker(&config, store).unwrap();
		assert_eq!(tracker.endpoint().as_str(), "http://127.0.0.1:9/t.gif");
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host lifecycle subscriptions.
//!
//! Hosts register [`Subscriber`]s against named lifecycle events and call
//! [`Subscriptions::dispatch`] when those events happen. Subscribers decide
//! whether the lifecycle event maps to a Tracks event.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use tracks_core::RecordOutcome;

use crate::client::Tracker;
use crate::context::RequestContext;
use crate::error::Result;
use crate::properties::Properties;

/// Lifecycle event fired when a post is saved.
pub const EDIT_POST: &str = "edit_post";

/// Reacts to a host lifecycle event.
#[async_trait]
pub trait Subscriber: Send + Sync {
	/// Returns `Ok(None)` when the payload is not relevant.
	async fn handle(
		&self,
		tracker: &Tracker,
		ctx: &RequestContext,
		payload: &Value,
	) -> Result<Option<RecordOutcome>>;
}

/// Registry of subscribers keyed by lifecycle event name.
pub struct Subscriptions {
	tracker: Tracker,
	handlers: HashMap<String, Vec<Arc<dyn Subscriber>>>,
}

impl Subscriptions {
	pub fn new(tracker: Tracker) -> Self {
		Self {
			tracker,
			handlers: HashMap::new(),
		}
	}

	/// Registry with the built-in subscribers already registered.
	pub fn with_defaults(tracker: Tracker) -> Self {
		let mut subscriptions = Self::new(tracker);
		subscriptions.register(EDIT_POST, Arc::new(ProductUpdatedSubscriber));
		subscriptions
	}

	pub fn register(&mut self, lifecycle_event: impl Into<String>, subscriber: Arc<dyn Subscriber>) {
		self.handlers
			.entry(lifecycle_event.into())
			.or_default()
			.push(subscriber);
	}

	/// Number of subscribers for a lifecycle event.
	pub fn subscriber_count(&self, lifecycle_event: &str) -> usize {
		self.handlers.get(lifecycle_event).map_or(0, Vec::len)
	}

	/// Runs every subscriber for `lifecycle_event` in registration order.
	///
	/// Subscriber errors are logged and do not stop later subscribers.
	pub async fn dispatch(
		&self,
		lifecycle_event: &str,
		ctx: &RequestContext,
		payload: &Value,
	) -> Vec<RecordOutcome> {
		let Some(subscribers) = self.handlers.get(lifecycle_event) else {
			return Vec::new();
		};

		let mut outcomes = Vec::new();
		for subscriber in subscribers {
			match subscriber.handle(&self.tracker, ctx, payload).await {
				Ok(Some(outcome)) => outcomes.push(outcome),
				Ok(None) => {}
				Err(e) => warn!(error = %e, lifecycle_event, "subscriber failed"),
			}
		}
		outcomes
	}
}

impl std::fmt::Debug for Subscriptions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut events: Vec<_> = self.handlers.keys().collect();
		events.sort();
		f.debug_struct("Subscriptions")
			.field("events", &events)
			.finish_non_exhaustive()
	}
}

#[derive(Debug, Deserialize)]
struct PostPayload {
	post_id: i64,
	post_type: String,
}

/// Records `update_product` when a product post is saved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductUpdatedSubscriber;

#[async_trait]
impl Subscriber for ProductUpdatedSubscriber {
	async fn handle(
		&self,
		tracker: &Tracker,
		ctx: &RequestContext,
		payload: &Value,
	) -> Result<Option<RecordOutcome>> {
		let post = match PostPayload::deserialize(payload) {
			Ok(post) => post,
			Err(e) => {
				debug!(error = %e, "ignoring malformed post payload");
				return Ok(None);
			}
		};

		if post.post_type != "product" {
			return Ok(None);
		}

		let outcome = tracker
			.record_event(
				ctx,
				"update_product",
				Properties::new().insert("product_id", post.post_id),
			)
			.await?;
		Ok(Some(outcome))
	}
}

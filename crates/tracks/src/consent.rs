// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracking consent.
//!
//! The site owner's opt-in comes from a [`ConsentProvider`]. A [`ConsentPolicy`]
//! hook sees that answer and returns the final decision, which lets the host
//! force tracking on or off. Provider failures count as "not consented".

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::ConsentError;

/// Source of the site-level tracking opt-in.
#[async_trait]
pub trait ConsentProvider: Send + Sync {
	async fn is_tracking_enabled(&self) -> Result<bool, ConsentError>;
}

/// A fixed opt-in answer, typically read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticConsent(pub bool);

#[async_trait]
impl ConsentProvider for StaticConsent {
	async fn is_tracking_enabled(&self) -> Result<bool, ConsentError> {
		Ok(self.0)
	}
}

/// Override hook: receives the provider's opt-in and returns the final decision.
pub type ConsentPolicy = Arc<dyn Fn(bool) -> bool + Send + Sync>;

/// Combines a provider and an optional policy hook into one decision.
#[derive(Clone)]
pub struct ConsentGate {
	provider: Arc<dyn ConsentProvider>,
	policy: Option<ConsentPolicy>,
}

impl ConsentGate {
	pub fn new(provider: Arc<dyn ConsentProvider>) -> Self {
		Self {
			provider,
			policy: None,
		}
	}

	pub fn with_policy(mut self, policy: ConsentPolicy) -> Self {
		self.policy = Some(policy);
		self
	}

	/// Final consent decision, or the provider's error.
	///
	/// The policy hook only runs when the provider answered.
	pub async fn check(&self) -> Result<bool, ConsentError> {
		let opted_in = self.provider.is_tracking_enabled().await?;
		Ok(match &self.policy {
			Some(policy) => policy(opted_in),
			None => opted_in,
		})
	}

	/// Returns true if events may be recorded. Fails closed.
	pub async fn allows_tracking(&self) -> bool {
		match self.check().await {
			Ok(allowed) => allowed,
			Err(e) => {
				warn!(error = %e, "consent provider failed, treating as not consented");
				false
			}
		}
	}
}

impl fmt::Debug for ConsentGate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConsentGate")
			.field("has_policy", &self.policy.is_some())
			.finish()
	}
}

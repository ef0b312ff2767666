// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{redirect, Client, ClientBuilder};
use std::time::Duration;

/// Product token used in the User-Agent.
const USER_AGENT_SLUG: &str = "tracks-client";

/// Transport limits for pixel requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPolicy {
	/// Whole-request timeout, connect included.
	pub timeout: Duration,
	/// Maximum redirect hops followed before the request fails.
	pub max_redirects: usize,
}

impl Default for PixelPolicy {
	fn default() -> Self {
		Self {
			timeout: Duration::from_secs(1),
			max_redirects: 2,
		}
	}
}

/// Creates a new HTTP client builder with the standard Tracks User-Agent header.
///
/// # Example
/// ```ignore
/// let client = tracks_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client builder with a custom User-Agent header.
pub fn builder_with_user_agent(user_agent: impl Into<String>) -> ClientBuilder {
	Client::builder().user_agent(user_agent.into())
}

/// Builds the client used for pixel requests.
///
/// Requests are HTTP/1.1 only, bounded by `policy.timeout`, and follow at most
/// `policy.max_redirects` hops. Pass `user_agent` to override the standard one.
pub fn pixel_client(
	policy: PixelPolicy,
	user_agent: Option<&str>,
) -> Result<Client, reqwest::Error> {
	let builder = match user_agent {
		Some(ua) => builder_with_user_agent(ua),
		None => builder(),
	};

	let client = builder
		.timeout(policy.timeout)
		.connect_timeout(policy.timeout)
		.redirect(redirect::Policy::limited(policy.max_redirects))
		.http1_only()
		.build()?;

	tracing::debug!(
		timeout_ms = u64::try_from(policy.timeout.as_millis()).unwrap_or(u64::MAX),
		max_redirects = policy.max_redirects,
		"pixel client built"
	);

	Ok(client)
}

/// Returns the standard Tracks User-Agent string.
///
/// Format: `tracks-client/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"{USER_AGENT_SLUG}/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

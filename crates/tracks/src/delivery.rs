// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pixel delivery over HTTP.

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use tracks_common_http::PixelPolicy;
use tracks_core::DeliveryResult;
use url::Url;

use crate::error::{Result, TracksError};

/// Sends encoded pixel URLs to the collector.
///
/// One GET per event, no retries. Anything other than `200 OK` counts as a
/// rejection; connection failures, timeouts and redirect overflow are
/// transport errors.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
	http: Client,
	policy: PixelPolicy,
}

impl DeliveryClient {
	pub fn new(policy: PixelPolicy, user_agent: Option<&str>) -> Result<Self> {
		let http = tracks_common_http::pixel_client(policy, user_agent)
			.map_err(TracksError::ClientBuild)?;
		Ok(Self { http, policy })
	}

	pub fn policy(&self) -> PixelPolicy {
		self.policy
	}

	pub async fn deliver(&self, url: &Url) -> DeliveryResult {
		let response = match self.http.get(url.clone()).send().await {
			Ok(response) => response,
			Err(e) => {
				warn!(
					error = %e,
					timeout = e.is_timeout(),
					redirect = e.is_redirect(),
					"pixel request failed"
				);
				return DeliveryResult::transport_error();
			}
		};

		let status = response.status();
		if status == StatusCode::OK {
			debug!(status = status.as_u16(), "pixel delivered");
			DeliveryResult::success(status.as_u16())
		} else {
			warn!(status = status.as_u16(), "collector rejected pixel");
			DeliveryResult::rejected(status.as_u16())
		}
	}
}

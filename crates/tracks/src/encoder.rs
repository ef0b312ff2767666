// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pixel URL encoding.

use tracing::debug;
use tracks_core::{format_timestamp, keys, validate_event_name, validate_property_key, Event};
use url::Url;

use crate::error::EncodingError;

/// Collector endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://pixel.wp.com/t.gif";

/// Longest pixel URL considered safe to send.
pub const DEFAULT_MAX_URL_LENGTH: usize = 8000;

/// Turns an [`Event`] into a GET URL for the collector.
///
/// Properties are written as form-urlencoded query pairs in map order, followed
/// by `_rt` and the `_=_` terminator. The collector treats a URL without the
/// terminator as truncated.
#[derive(Debug, Clone)]
pub struct EventEncoder {
	endpoint: Url,
	max_url_length: usize,
}

impl EventEncoder {
	pub fn new(endpoint: Url, max_url_length: usize) -> Self {
		Self {
			endpoint,
			max_url_length,
		}
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	pub fn encode(&self, event: &Event, request_ts_ms: i64) -> Result<Url, EncodingError> {
		validate_event_name(event.name())?;

		let mut url = self.endpoint.clone();
		{
			let mut query = url.query_pairs_mut();
			for (key, value) in event.properties().iter() {
				validate_property_key(key)?;
				if key == keys::REQUEST_TIMESTAMP || key == keys::TERMINATOR {
					continue;
				}
				if let Some(value) = value.to_query_value() {
					query.append_pair(key, &value);
				}
			}
			query.append_pair(keys::REQUEST_TIMESTAMP, &format_timestamp(request_ts_ms));
			query.append_pair(keys::TERMINATOR, keys::TERMINATOR);
		}

		let length = url.as_str().len();
		if length > self.max_url_length {
			return Err(EncodingError::TooLong {
				length,
				max: self.max_url_length,
			});
		}

		debug!(event = event.name(), url_length = length, "encoded pixel URL");
		Ok(url)
	}
}

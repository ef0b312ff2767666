// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Tracks SDK.

use thiserror::Error;
use tracks_core::{ErrorKind, ValidationError};

/// Result type alias for Tracks operations.
pub type Result<T> = std::result::Result<T, TracksError>;

/// Tracks SDK errors.
#[derive(Debug, Error)]
pub enum TracksError {
	/// Collector endpoint is missing or not an http(s) URL.
	#[error("invalid collector endpoint: {0}")]
	InvalidEndpoint(String),

	/// The HTTP client could not be constructed.
	#[error("failed to build HTTP client: {0}")]
	ClientBuild(#[source] reqwest::Error),

	/// The event could not be encoded into a pixel URL.
	#[error("event encoding failed: {0}")]
	Encoding(#[from] EncodingError),

	/// The identity store failed.
	#[error(transparent)]
	Store(#[from] StoreError),

	/// The account-linking provider failed.
	#[error(transparent)]
	Linking(#[from] LinkingError),

	/// The consent provider failed.
	#[error(transparent)]
	Consent(#[from] ConsentError),

	/// A value violated a core invariant.
	#[error(transparent)]
	Validation(#[from] ValidationError),
}

/// Reasons an event cannot be turned into a pixel URL.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
	/// The URL would exceed the safe transport length.
	#[error("pixel URL is {length} bytes, limit is {max}")]
	TooLong { length: usize, max: usize },

	/// The event name or a property key is malformed.
	#[error(transparent)]
	Validation(#[from] ValidationError),
}

impl EncodingError {
	pub fn kind(&self) -> ErrorKind {
		ErrorKind::Encoding
	}
}

/// Identity store failures.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("identity store backend error: {0}")]
	Backend(String),
}

/// Account-linking provider failures.
#[derive(Debug, Error)]
pub enum LinkingError {
	/// The provider could not be reached.
	#[error("account linking unavailable: {0}")]
	Unavailable(String),

	/// The provider has no linked id for a principal it reported as linked.
	#[error("principal {0} has no linked account id")]
	MissingLinkedId(String),
}

/// Consent provider failures.
#[derive(Debug, Error)]
pub enum ConsentError {
	#[error("tracking consent unavailable: {0}")]
	Unavailable(String),
}

/// Client cookie write failures.
#[derive(Debug, Error)]
pub enum CookieError {
	/// Headers are already on the wire.
	#[error("response already started")]
	ResponseStarted,

	#[error("cookie rejected: {0}")]
	Rejected(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn encoding_error_maps_to_encoding_kind() {
		let err = EncodingError::TooLong {
			length: 9000,
			max: 8000,
		};
		assert_eq!(err.kind(), ErrorKind::Encoding);
		assert_eq!(err.to_string(), "pixel URL is 9000 bytes, limit is 8000");
	}

	#[test]
	fn validation_converts_into_encoding() {
		let err: EncodingError = ValidationError::InvalidEventName("Bad".to_string()).into();
		assert!(matches!(err, EncodingError::Validation(_)));
	}

	#[test]
	fn store_error_is_transparent() {
		let err: TracksError = StoreError::Backend("disk full".to_string()).into();
		assert_eq!(err.to_string(), "identity store backend error: disk full");
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Validation errors for core Tracks types.

use thiserror::Error;

/// Result type alias for core validation.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Errors raised when a value does not satisfy a core invariant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
	/// An identity was built with an empty id.
	#[error("identity id must not be empty")]
	EmptyIdentityId,

	/// A string is not a well-formed anonymous token.
	#[error("invalid anonymous token: {0:?}")]
	InvalidAnonToken(String),

	/// Event names must be lowercase snake case.
	#[error("invalid event name: {0:?}")]
	InvalidEventName(String),

	/// Property keys must be lowercase snake case, optionally `_`-prefixed.
	#[error("invalid property key: {0:?}")]
	InvalidPropertyKey(String),
}

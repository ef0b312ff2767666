// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Tracks usage-analytics pipeline.
//!
//! This crate holds the data model shared by the SDK (`tracks`), the identity
//! store backends and the CLI. It performs no I/O.
//!
//! # Overview
//!
//! - [`Identity`] / [`AnonToken`]: who an event is recorded for
//! - [`PropertyMap`] / [`PropertyValue`]: the flat, ordered property bag
//! - [`Event`]: an immutable event ready for encoding
//! - [`DeliveryResult`] / [`RecordOutcome`]: typed results at the pipeline boundary

pub mod error;
pub mod event;
pub mod identity;
pub mod keys;
pub mod outcome;
pub mod property;

pub use error::{Result, ValidationError};
pub use event::{
	format_timestamp, timestamp_ms_now, validate_event_name, validate_property_key, Event,
};
pub use identity::{AnonToken, Identity, IdentityType, ANON_COOKIE_NAME, ANON_TOKEN_PREFIX};
pub use outcome::{DeliveryResult, ErrorKind, NotTrackedReason, RecordOutcome};
pub use property::{PropertyMap, PropertyValue};

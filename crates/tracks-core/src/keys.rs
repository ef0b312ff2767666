// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Property keys understood by the collector.
//!
//! Keys starting with [`RESERVED_PREFIX`] belong to the pipeline; callers
//! cannot set them.

pub const RESERVED_PREFIX: char = '_';

/// Event name.
pub const EVENT_NAME: &str = "_en";
/// Event creation time, milliseconds since the epoch.
pub const TIMESTAMP: &str = "_ts";
/// Identity type tag.
pub const IDENTITY_TYPE: &str = "_ut";
/// Identity id.
pub const IDENTITY_ID: &str = "_ui";

pub const USER_AGENT: &str = "_via_ua";
pub const REMOTE_IP: &str = "_via_ip";
pub const ACCEPT_LANGUAGE: &str = "_lg";
pub const REFERRER: &str = "_dr";
/// Full URL of the request that triggered the event.
pub const DOCUMENT_LOCATION: &str = "_dl";

/// Send time, stamped by the encoder.
pub const REQUEST_TIMESTAMP: &str = "_rt";
/// Final `_=_` pair marking an untruncated pixel URL.
pub const TERMINATOR: &str = "_";

pub const SITE_URL: &str = "url";
pub const SITE_LANGUAGE: &str = "blog_lang";
pub const SITE_ID: &str = "blog_id";

/// Returns true for keys owned by the pipeline.
pub fn is_reserved(key: &str) -> bool {
	key.starts_with(RESERVED_PREFIX)
}

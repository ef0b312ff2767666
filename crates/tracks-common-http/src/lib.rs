// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Tracks.
//!
//! This crate provides:
//! - A pre-configured HTTP client builder with a consistent User-Agent header
//! - The pixel transport policy (short timeout, capped redirects, HTTP/1.1)

mod client;

pub use client::{builder, builder_with_user_agent, pixel_client, user_agent, PixelPolicy};

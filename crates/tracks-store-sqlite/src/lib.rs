// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite-backed [`tracks::IdentityStore`].
//!
//! Identities live in `tracks_principal_meta`, keyed on
//! `(principal_id, meta_key)`. Write-once semantics come from
//! `INSERT OR IGNORE` against that primary key.

pub mod error;
pub mod pool;
pub mod store;

pub use error::{DbError, Result};
pub use pool::{create_pool, run_migrations};
pub use store::SqliteIdentityStore;

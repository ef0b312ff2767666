// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-principal metadata store used to persist identities.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;

/// Metadata key holding a principal's linked account id.
pub const LINKED_ID_KEY: &str = "tracks_linked_id";

/// Metadata key holding a principal's anonymous token.
pub const ANON_ID_KEY: &str = "tracks_anon_id";

/// Key/value metadata scoped to a principal.
///
/// `set_if_absent` must be atomic: when two callers race on the same
/// `(principal_id, key)`, exactly one write is stored and the loser gets
/// `Ok(false)`.
#[async_trait]
pub trait IdentityStore: Send + Sync {
	async fn get(&self, principal_id: &str, key: &str) -> Result<Option<String>, StoreError>;

	/// Stores `value` unless a value already exists. Returns true if written.
	async fn set_if_absent(
		&self,
		principal_id: &str,
		key: &str,
		value: &str,
	) -> Result<bool, StoreError>;

	/// Replaces the stored value only while it still equals `current`.
	/// Returns true if written. Atomic like `set_if_absent`.
	async fn compare_and_set(
		&self,
		principal_id: &str,
		key: &str,
		current: &str,
		value: &str,
	) -> Result<bool, StoreError>;
}

/// In-process identity store.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
	entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryIdentityStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of stored entries.
	pub async fn len(&self) -> usize {
		self.entries.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.lock().await.is_empty()
	}
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
	async fn get(&self, principal_id: &str, key: &str) -> Result<Option<String>, StoreError> {
		let entries = self.entries.lock().await;
		Ok(entries
			.get(&(principal_id.to_string(), key.to_string()))
			.cloned())
	}

	async fn set_if_absent(
		&self,
		principal_id: &str,
		key: &str,
		value: &str,
	) -> Result<bool, StoreError> {
		use std::collections::hash_map::Entry;

		let mut entries = self.entries.lock().await;
		match entries.entry((principal_id.to_string(), key.to_string())) {
			Entry::Occupied(_) => Ok(false),
			Entry::Vacant(slot) => {
				slot.insert(value.to_string());
				Ok(true)
			}
		}
	}

	async fn compare_and_set(
		&self,
		principal_id: &str,
		key: &str,
		current: &str,
		value: &str,
	) -> Result<bool, StoreError> {
		let mut entries = self.entries.lock().await;
		match entries.get_mut(&(principal_id.to_string(), key.to_string())) {
			Some(stored) if stored == current => {
				*stored = value.to_string();
				Ok(true)
			}
			_ => Ok(false),
		}
	}
}

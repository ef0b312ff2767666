// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracks::{IdentityStore, StoreError};

use crate::error::DbError;
use crate::pool::{create_pool, run_migrations};

#[derive(Clone)]
pub struct SqliteIdentityStore {
	pool: SqlitePool,
}

impl SqliteIdentityStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Opens (or creates) the database at `database_url` and applies migrations.
	pub async fn connect(database_url: &str) -> Result<Self, DbError> {
		let pool = create_pool(database_url).await?;
		run_migrations(&pool).await?;
		Ok(Self::new(pool))
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	#[tracing::instrument(skip(self), fields(principal_id = %principal_id, key = %key))]
	pub async fn get_meta(&self, principal_id: &str, key: &str) -> Result<Option<String>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT meta_value
			FROM tracks_principal_meta
			WHERE principal_id = ? AND meta_key = ?
			"#,
		)
		.bind(principal_id)
		.bind(key)
		.fetch_optional(&self.pool)
		.await?;

		Ok(row.map(|r| r.get("meta_value")))
	}

	/// Returns true if this call stored the value.
	#[tracing::instrument(skip(self, value), fields(principal_id = %principal_id, key = %key))]
	pub async fn insert_meta_if_absent(
		&self,
		principal_id: &str,
		key: &str,
		value: &str,
	) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			INSERT OR IGNORE INTO tracks_principal_meta (principal_id, meta_key, meta_value, created_at)
			VALUES (?, ?, ?, ?)
			"#,
		)
		.bind(principal_id)
		.bind(key)
		.bind(value)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() == 1)
	}

	/// Returns true if the stored value still equaled `current` and was replaced.
	#[tracing::instrument(skip(self, current, value), fields(principal_id = %principal_id, key = %key))]
	pub async fn update_meta_if_equals(
		&self,
		principal_id: &str,
		key: &str,
		current: &str,
		value: &str,
	) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			UPDATE tracks_principal_meta
			SET meta_value = ?
			WHERE principal_id = ? AND meta_key = ? AND meta_value = ?
			"#,
		)
		.bind(value)
		.bind(principal_id)
		.bind(key)
		.bind(current)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() == 1)
	}
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
	async fn get(&self, principal_id: &str, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.get_meta(principal_id, key).await?)
	}

	async fn set_if_absent(
		&self,
		principal_id: &str,
		key: &str,
		value: &str,
	) -> Result<bool, StoreError> {
		Ok(self.insert_meta_if_absent(principal_id, key, value).await?)
	}

	async fn compare_and_set(
		&self,
		principal_id: &str,
		key: &str,
		current: &str,
		value: &str,
	) -> Result<bool, StoreError> {
		Ok(self
			.update_meta_if_equals(principal_id, key, current, value)
			.await?)
	}
}

impl std::fmt::Debug for SqliteIdentityStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SqliteIdentityStore").finish_non_exhaustive()
	}
}

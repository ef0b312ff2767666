// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity resolution for the acting principal.
//!
//! Resolution order:
//!
//! 1. Linked principal with a stored linked id → that id.
//! 2. Linked principal without one → fetch from the provider, store it
//!    write-once, use it.
//! 3. Otherwise the stored anonymous token, creating one write-once if absent.
//!
//! Conditional writes make concurrent first events for one principal converge
//! on a single stored value: a writer that loses the race reads back the winner.
//! A blank stored value counts as missing and is swapped out with a
//! compare-and-set, so one bad write cannot lock a principal out.

use std::sync::Arc;

use tracing::{debug, warn};
use tracks_core::{AnonToken, Identity, IdentityType, ANON_COOKIE_NAME};

use crate::context::RequestContext;
use crate::error::{LinkingError, Result, StoreError};
use crate::linking::SharedAccountLinking;
use crate::store::{IdentityStore, ANON_ID_KEY, LINKED_ID_KEY};

/// Resolves and persists principal identities.
#[derive(Clone)]
pub struct IdentityResolver {
	store: Arc<dyn IdentityStore>,
	linking: SharedAccountLinking,
}

impl IdentityResolver {
	pub fn new(store: Arc<dyn IdentityStore>, linking: SharedAccountLinking) -> Self {
		Self { store, linking }
	}

	/// Resolves the identity for the context's principal.
	///
	/// The result is memoized on the context; later calls within the same
	/// request do not touch the store or the linking provider.
	pub async fn resolve(&self, ctx: &RequestContext) -> Result<Identity> {
		let identity = ctx
			.identity_cell()
			.get_or_try_init(|| self.resolve_uncached(ctx))
			.await?;
		Ok(identity.clone())
	}

	/// Resolves the identity an event would carry without writing anything.
	///
	/// Stored and memoized identities are used as-is. A principal with nothing
	/// stored gets a throwaway identity that is neither persisted nor sent to
	/// the client cookie.
	pub async fn peek(&self, ctx: &RequestContext) -> Result<Identity> {
		if let Some(identity) = ctx.resolved_identity() {
			return Ok(identity.clone());
		}

		let principal_id = ctx.principal().id.as_str();
		if self.linking.is_linked(principal_id).await? {
			let id = match self.stored(principal_id, LINKED_ID_KEY).await? {
				Some(stored) => stored,
				None => self.fetch_linked_id(principal_id).await?,
			};
			return Ok(Identity::linked(id)?);
		}

		let token = match self.stored(principal_id, ANON_ID_KEY).await? {
			Some(stored) => stored,
			None => anon_candidate(ctx).into(),
		};
		Ok(Identity::new(IdentityType::Anonymous, token)?)
	}

	async fn resolve_uncached(&self, ctx: &RequestContext) -> Result<Identity> {
		let principal_id = ctx.principal().id.as_str();

		if self.linking.is_linked(principal_id).await? {
			let identity = self.resolve_linked(principal_id).await?;
			debug!(principal_id, identity_type = %identity.kind(), "resolved linked identity");
			return Ok(identity);
		}

		let token = self.resolve_anonymous(ctx).await?;
		self.mirror_cookie(ctx, &token);

		debug!(principal_id, identity_type = "anon", "resolved anonymous identity");
		Ok(Identity::new(IdentityType::Anonymous, token)?)
	}

	async fn resolve_linked(&self, principal_id: &str) -> Result<Identity> {
		if let Some(stored) = self.stored(principal_id, LINKED_ID_KEY).await? {
			return Ok(Identity::linked(stored)?);
		}

		let fetched = self.fetch_linked_id(principal_id).await?;
		let id = self.store_once(principal_id, LINKED_ID_KEY, fetched).await?;
		Ok(Identity::linked(id)?)
	}

	/// Asks the provider for the linked id. Blank ids are never persisted.
	async fn fetch_linked_id(&self, principal_id: &str) -> Result<String> {
		let fetched = self.linking.linked_id(principal_id).await?;
		if fetched.trim().is_empty() {
			return Err(LinkingError::MissingLinkedId(principal_id.to_string()).into());
		}
		Ok(fetched)
	}

	async fn resolve_anonymous(&self, ctx: &RequestContext) -> Result<String> {
		let principal_id = ctx.principal().id.as_str();

		if let Some(stored) = self.stored(principal_id, ANON_ID_KEY).await? {
			if !AnonToken::is_well_formed(&stored) {
				warn!(principal_id, "stored anonymous token has unexpected format");
			}
			return Ok(stored);
		}

		self.store_once(principal_id, ANON_ID_KEY, anon_candidate(ctx).into())
			.await
	}

	/// Reads a non-empty stored value.
	async fn stored(&self, principal_id: &str, key: &str) -> Result<Option<String>> {
		Ok(self
			.store
			.get(principal_id, key)
			.await?
			.filter(|v| !v.is_empty()))
	}

	/// Writes `value` if nothing is stored yet and returns whatever ends up stored.
	async fn store_once(&self, principal_id: &str, key: &str, value: String) -> Result<String> {
		if self.store.set_if_absent(principal_id, key, &value).await? {
			debug!(principal_id, key, "persisted identity");
			return Ok(value);
		}

		match self.store.get(principal_id, key).await? {
			Some(stored) if !stored.is_empty() => {
				debug!(principal_id, key, "lost identity write race, using stored value");
				Ok(stored)
			}
			Some(_) => {
				warn!(principal_id, key, "replacing blank stored identity");
				if self.store.compare_and_set(principal_id, key, "", &value).await? {
					return Ok(value);
				}
				self.stored(principal_id, key)
					.await?
					.ok_or_else(|| missing_after_refusal(key))
			}
			None => Err(missing_after_refusal(key)),
		}
	}

	/// Best-effort `tk_ai` cookie write, at most once per request.
	fn mirror_cookie(&self, ctx: &RequestContext, token: &str) {
		if ctx.anon_cookie() == Some(token) {
			return;
		}

		let sink = ctx.cookie_sink();
		if sink.response_started() {
			debug!("response already started, skipping anonymous cookie");
			return;
		}

		if !ctx.claim_cookie_write() {
			return;
		}

		if let Err(e) = sink.set_cookie(ANON_COOKIE_NAME, token) {
			debug!(error = %e, "failed to set anonymous cookie");
		}
	}
}

/// The client's well-formed `tk_ai` token, or a fresh one.
fn anon_candidate(ctx: &RequestContext) -> AnonToken {
	match ctx.anon_cookie().map(AnonToken::parse) {
		Some(Ok(token)) => {
			debug!(principal_id = %ctx.principal().id, "adopting anonymous token from client cookie");
			token
		}
		_ => AnonToken::generate(),
	}
}

fn missing_after_refusal(key: &str) -> crate::error::TracksError {
	StoreError::Backend(format!(
		"conditional write for {key} was refused but no value is stored"
	))
	.into()
}

impl std::fmt::Debug for IdentityResolver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("IdentityResolver").finish_non_exhaustive()
	}
}

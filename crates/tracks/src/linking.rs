// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account-linking integration.
//!
//! When a principal has connected an external account, events are attributed
//! to that account's id instead of an anonymous token. Hosts without such an
//! integration use [`NullAccountLinking`], which reports every principal as
//! unlinked. The provider is chosen once when the tracker is built.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LinkingError;

/// Source of truth for whether a principal has a linked account.
#[async_trait]
pub trait AccountLinkingProvider: Send + Sync {
	/// Returns true if the principal is currently linked.
	async fn is_linked(&self, principal_id: &str) -> Result<bool, LinkingError>;

	/// Returns the canonical linked account id for a linked principal.
	async fn linked_id(&self, principal_id: &str) -> Result<String, LinkingError>;
}

/// Type alias for a shared account-linking provider.
pub type SharedAccountLinking = Arc<dyn AccountLinkingProvider>;

/// Provider for hosts with no account-linking integration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAccountLinking;

#[async_trait]
impl AccountLinkingProvider for NullAccountLinking {
	async fn is_linked(&self, _principal_id: &str) -> Result<bool, LinkingError> {
		Ok(false)
	}

	async fn linked_id(&self, principal_id: &str) -> Result<String, LinkingError> {
		Err(LinkingError::MissingLinkedId(principal_id.to_string()))
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Principal identity types.
//!
//! Every event is attributed either to a linked account id (when the principal
//! has connected an external account) or to an anonymous token that is
//! generated once per principal and persisted by the identity store.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Namespace prefix for anonymous tokens.
pub const ANON_TOKEN_PREFIX: &str = "woo:";

/// Name of the client cookie mirroring the anonymous token.
pub const ANON_COOKIE_NAME: &str = "tk_ai";

/// Number of random bytes in an anonymous token. 18 bytes encode to 24 base64 chars.
const ANON_TOKEN_BYTES: usize = 18;
const ANON_TOKEN_ENCODED_LEN: usize = 24;

/// The kind of identity an event is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityType {
	/// No linked account; identified by an [`AnonToken`].
	Anonymous,
	/// Identified by the id of a linked external account.
	LinkedAccount,
}

impl IdentityType {
	/// The `_ut` tag the collector expects for this identity type.
	pub fn as_tag(&self) -> &'static str {
		match self {
			IdentityType::Anonymous => "anon",
			IdentityType::LinkedAccount => "wpcom:user_id",
		}
	}
}

impl fmt::Display for IdentityType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_tag())
	}
}

/// A resolved identity for one principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
	#[serde(rename = "type")]
	kind: IdentityType,
	id: String,
}

impl Identity {
	/// Creates an identity, rejecting empty ids.
	pub fn new(kind: IdentityType, id: impl Into<String>) -> Result<Self> {
		let id = id.into();
		if id.is_empty() {
			return Err(ValidationError::EmptyIdentityId);
		}
		Ok(Self { kind, id })
	}

	/// Creates an anonymous identity from a token.
	pub fn anonymous(token: AnonToken) -> Self {
		Self {
			kind: IdentityType::Anonymous,
			id: token.0,
		}
	}

	/// Creates a linked-account identity.
	pub fn linked(id: impl Into<String>) -> Result<Self> {
		Self::new(IdentityType::LinkedAccount, id)
	}

	pub fn kind(&self) -> IdentityType {
		self.kind
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn is_anonymous(&self) -> bool {
		self.kind == IdentityType::Anonymous
	}
}

/// An anonymous identity surrogate: `woo:` followed by 24 base64 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnonToken(String);

impl AnonToken {
	/// Generates a fresh token from the operating system's CSPRNG.
	pub fn generate() -> Self {
		let mut bytes = [0u8; ANON_TOKEN_BYTES];
		OsRng.fill_bytes(&mut bytes);
		Self(format!("{ANON_TOKEN_PREFIX}{}", STANDARD.encode(bytes)))
	}

	/// Parses and validates a token string.
	pub fn parse(value: &str) -> Result<Self> {
		if Self::is_well_formed(value) {
			Ok(Self(value.to_string()))
		} else {
			Err(ValidationError::InvalidAnonToken(value.to_string()))
		}
	}

	/// Returns true if `value` has the anonymous token shape.
	pub fn is_well_formed(value: &str) -> bool {
		let Some(body) = value.strip_prefix(ANON_TOKEN_PREFIX) else {
			return false;
		};
		body.len() == ANON_TOKEN_ENCODED_LEN
			&& body
				.bytes()
				.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for AnonToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl FromStr for AnonToken {
	type Err = ValidationError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl TryFrom<String> for AnonToken {
	type Error = ValidationError;

	fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
		if Self::is_well_formed(&value) {
			Ok(Self(value))
		} else {
			Err(ValidationError::InvalidAnonToken(value))
		}
	}
}

impl From<AnonToken> for String {
	fn from(token: AnonToken) -> Self {
		token.0
	}
}

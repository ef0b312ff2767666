// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed results returned at the pipeline boundary.

use serde::{Deserialize, Serialize};

/// Why a delivery attempt failed. Every kind is terminal; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// The event could not be turned into a pixel URL.
	Encoding,
	/// DNS, connect, timeout or redirect failure.
	Transport,
	/// The collector answered with something other than 200.
	RemoteRejected,
}

/// Result of a single pixel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
	pub ok: bool,
	/// HTTP status, or 0 when no response was received.
	pub status_code: u16,
	pub error: Option<ErrorKind>,
}

impl DeliveryResult {
	pub fn success(status_code: u16) -> Self {
		Self {
			ok: true,
			status_code,
			error: None,
		}
	}

	pub fn transport_error() -> Self {
		Self {
			ok: false,
			status_code: 0,
			error: Some(ErrorKind::Transport),
		}
	}

	pub fn rejected(status_code: u16) -> Self {
		Self {
			ok: false,
			status_code,
			error: Some(ErrorKind::RemoteRejected),
		}
	}

	pub fn encoding_error() -> Self {
		Self {
			ok: false,
			status_code: 0,
			error: Some(ErrorKind::Encoding),
		}
	}
}

/// Why an event was suppressed before anything was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotTrackedReason {
	/// Tracking is not consented to, or the policy hook turned it off.
	ConsentDenied,
	/// The principal is an automated or test account.
	AutomatedPrincipal,
	/// The consent provider, identity store or account-linking provider failed.
	CollaboratorUnavailable,
}

/// What happened to a `record_event` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
	NotTracked { reason: NotTrackedReason },
	Delivered { result: DeliveryResult },
}

impl RecordOutcome {
	pub fn not_tracked(reason: NotTrackedReason) -> Self {
		RecordOutcome::NotTracked { reason }
	}

	pub fn delivered(result: DeliveryResult) -> Self {
		RecordOutcome::Delivered { result }
	}

	/// True only when the collector accepted the pixel.
	pub fn is_delivered(&self) -> bool {
		matches!(self, RecordOutcome::Delivered { result } if result.ok)
	}

	pub fn delivery(&self) -> Option<&DeliveryResult> {
		match self {
			RecordOutcome::Delivered { result } => Some(result),
			RecordOutcome::NotTracked { .. } => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn constructors_classify() {
		assert!(DeliveryResult::success(200).ok);
		assert_eq!(DeliveryResult::transport_error().status_code, 0);
		assert_eq!(DeliveryResult::rejected(503).error, Some(ErrorKind::RemoteRejected));
		assert_eq!(DeliveryResult::encoding_error().error, Some(ErrorKind::Encoding));
	}

	#[test]
	fn is_delivered_requires_ok() {
		assert!(RecordOutcome::delivered(DeliveryResult::success(200)).is_delivered());
		assert!(!RecordOutcome::delivered(DeliveryResult::rejected(500)).is_delivered());
		assert!(!RecordOutcome::not_tracked(NotTrackedReason::ConsentDenied).is_delivered());
	}

	#[test]
	fn outcome_serializes_with_tag() {
		let json = serde_json::to_value(RecordOutcome::not_tracked(NotTrackedReason::ConsentDenied)).unwrap();
		assert_eq!(json["outcome"], "not_tracked");
		assert_eq!(json["reason"], "consent_denied");
	}
}

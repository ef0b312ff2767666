// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-request context passed through the pipeline.
//!
//! A [`RequestContext`] lives for one host request. It carries the acting
//! principal, the request details that become server-context properties, the
//! cookie channel, and the memoized identity for that request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracks_core::Identity;

use crate::error::CookieError;

/// The user or session an event is recorded for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
	pub id: String,
	/// Preferred locale, reported as `blog_lang` when set.
	pub locale: Option<String>,
	/// Automated and test principals are never tracked.
	pub automated: bool,
}

impl Principal {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			locale: None,
			automated: false,
		}
	}

	pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
		self.locale = Some(locale.into());
		self
	}

	pub fn automated(mut self) -> Self {
		self.automated = true;
		self
	}
}

/// Details of the inbound request that triggered an event.
///
/// Every field is optional; missing values are sent as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerContext {
	pub user_agent: Option<String>,
	pub remote_addr: Option<String>,
	pub accept_language: Option<String>,
	pub referrer: Option<String>,
	/// `http` or `https`. Defaults to `http` when a host is known.
	pub scheme: Option<String>,
	pub host: Option<String>,
	/// Path and query, e.g. `/wp-admin/post.php?post=12`.
	pub request_uri: Option<String>,
}

impl ServerContext {
	/// Full URL of the request, or an empty string when the host is unknown.
	pub fn document_location(&self) -> String {
		match self.host.as_deref().filter(|h| !h.is_empty()) {
			Some(host) => format!(
				"{}://{}{}",
				self.scheme.as_deref().unwrap_or("http"),
				host,
				self.request_uri.as_deref().unwrap_or("")
			),
			None => String::new(),
		}
	}
}

/// One-way channel for setting cookies on the host's response.
pub trait CookieSink: Send + Sync {
	/// True once response headers have been sent.
	fn response_started(&self) -> bool;

	fn set_cookie(&self, name: &str, value: &str) -> Result<(), CookieError>;
}

/// Sink for hosts without a response to write to (CLI, background jobs).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCookies;

impl CookieSink for NoCookies {
	fn response_started(&self) -> bool {
		true
	}

	fn set_cookie(&self, _name: &str, _value: &str) -> Result<(), CookieError> {
		Err(CookieError::ResponseStarted)
	}
}

/// Buffers cookies until the host copies them onto its response.
#[derive(Debug, Default)]
pub struct MemoryCookieSink {
	started: AtomicBool,
	cookies: Mutex<Vec<(String, String)>>,
}

impl MemoryCookieSink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks the response as started; later writes are refused.
	pub fn mark_started(&self) {
		self.started.store(true, Ordering::SeqCst);
	}

	/// Cookies written so far, in write order.
	pub fn cookies(&self) -> Vec<(String, String)> {
		self.cookies
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.clone()
	}
}

impl CookieSink for MemoryCookieSink {
	fn response_started(&self) -> bool {
		self.started.load(Ordering::SeqCst)
	}

	fn set_cookie(&self, name: &str, value: &str) -> Result<(), CookieError> {
		if self.response_started() {
			return Err(CookieError::ResponseStarted);
		}
		self.cookies
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.push((name.to_string(), value.to_string()));
		Ok(())
	}
}

/// State scoped to one host request.
pub struct RequestContext {
	principal: Principal,
	server: ServerContext,
	anon_cookie: Option<String>,
	cookies: Arc<dyn CookieSink>,
	identity: OnceCell<Identity>,
	cookie_written: AtomicBool,
}

impl RequestContext {
	pub fn new(principal: Principal) -> Self {
		Self {
			principal,
			server: ServerContext::default(),
			anon_cookie: None,
			cookies: Arc::new(NoCookies),
			identity: OnceCell::new(),
			cookie_written: AtomicBool::new(false),
		}
	}

	pub fn with_server(mut self, server: ServerContext) -> Self {
		self.server = server;
		self
	}

	/// Sets the `tk_ai` cookie value the client sent with this request.
	pub fn with_anon_cookie(mut self, value: impl Into<String>) -> Self {
		self.anon_cookie = Some(value.into());
		self
	}

	pub fn with_cookie_sink(mut self, sink: Arc<dyn CookieSink>) -> Self {
		self.cookies = sink;
		self
	}

	pub fn principal(&self) -> &Principal {
		&self.principal
	}

	pub fn server(&self) -> &ServerContext {
		&self.server
	}

	pub fn anon_cookie(&self) -> Option<&str> {
		self.anon_cookie.as_deref()
	}

	/// The identity resolved for this request, if resolution has happened.
	pub fn resolved_identity(&self) -> Option<&Identity> {
		self.identity.get()
	}

	pub(crate) fn identity_cell(&self) -> &OnceCell<Identity> {
		&self.identity
	}

	pub(crate) fn cookie_sink(&self) -> &dyn CookieSink {
		self.cookies.as_ref()
	}

	/// Claims the single cookie write allowed per request.
	pub(crate) fn claim_cookie_write(&self) -> bool {
		!self.cookie_written.swap(true, Ordering::SeqCst)
	}
}

impl std::fmt::Debug for RequestContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RequestContext")
			.field("principal", &self.principal)
			.field("server", &self.server)
			.field("anon_cookie", &self.anon_cookie)
			.field("identity", &self.identity.get())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn document_location_joins_parts() {
		let server = ServerContext {
			scheme: Some("https".to_string()),
			host: Some("shop.example".to_string()),
			request_uri: Some("/wp-admin/post.php?post=12".to_string()),
			..Default::default()
		};
		assert_eq!(
			server.document_location(),
			"https://shop.example/wp-admin/post.php?post=12"
		);
	}

	#[test]
	fn document_location_defaults_scheme() {
		let server = ServerContext {
			host: Some("shop.example".to_string()),
			..Default::default()
		};
		assert_eq!(server.document_location(), "http://shop.example");
	}

	#[test]
	fn document_location_empty_without_host() {
		let server = ServerContext {
			request_uri: Some("/cart".to_string()),
			..Default::default()
		};
		assert_eq!(server.document_location(), "");
	}

	#[test]
	fn memory_sink_refuses_after_start() {
		let sink = MemoryCookieSink::new();
		sink.set_cookie("tk_ai", "one").unwrap();
		sink.mark_started();

		assert!(matches!(
			sink.set_cookie("tk_ai", "two"),
			Err(CookieError::ResponseStarted)
		));
		assert_eq!(sink.cookies(), vec![("tk_ai".to_string(), "one".to_string())]);
	}

	#[test]
	fn cookie_write_claimed_once() {
		let ctx = RequestContext::new(Principal::new("1"));
		assert!(ctx.claim_cookie_write());
		assert!(!ctx.claim_cookie_write());
	}

	#[test]
	fn principal_builders() {
		let principal = Principal::new("7").with_locale("fr_FR").automated();
		assert_eq!(principal.locale.as_deref(), Some("fr_FR"));
		assert!(principal.automated);
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Property assembly.
//!
//! Builds the flat property map for one event. Sources are merged in this
//! order, later sources overwriting earlier ones:
//!
//! 1. site context (`url`, `blog_lang`, `blog_id`)
//! 2. request context (`_via_ua`, `_via_ip`, `_lg`, `_dr`, `_dl`)
//! 3. identity (`_ut`, `_ui`)
//! 4. caller properties, minus any reserved `_` keys
//! 5. system fields (`_en`, `_ts`)

use tracing::warn;
use tracks_core::{format_timestamp, keys, Identity, PropertyMap};

use crate::context::RequestContext;

/// Default prefix applied to every event name.
pub const DEFAULT_EVENT_PREFIX: &str = "wca_test_";

/// Site-wide properties attached to every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteContext {
	pub url: String,
	/// Fallback for `blog_lang` when the principal has no locale.
	pub language: String,
	pub blog_id: Option<i64>,
}

impl Default for SiteContext {
	fn default() -> Self {
		Self {
			url: String::new(),
			language: "en_US".to_string(),
			blog_id: None,
		}
	}
}

#[derive(Debug, Clone)]
pub struct PropertyAssembler {
	site: SiteContext,
	event_prefix: String,
}

impl Default for PropertyAssembler {
	fn default() -> Self {
		Self::new(SiteContext::default(), DEFAULT_EVENT_PREFIX)
	}
}

impl PropertyAssembler {
	pub fn new(site: SiteContext, event_prefix: impl Into<String>) -> Self {
		Self {
			site,
			event_prefix: event_prefix.into(),
		}
	}

	pub fn site(&self) -> &SiteContext {
		&self.site
	}

	/// The name sent as `_en` for a caller-supplied event name.
	pub fn full_event_name(&self, event_name: &str) -> String {
		format!("{}{}", self.event_prefix, event_name)
	}

	pub fn assemble(
		&self,
		event_name: &str,
		caller: impl Into<PropertyMap>,
		identity: &Identity,
		ctx: &RequestContext,
		timestamp_ms: i64,
	) -> PropertyMap {
		let mut props = PropertyMap::new();

		let language = ctx
			.principal()
			.locale
			.clone()
			.filter(|l| !l.is_empty())
			.unwrap_or_else(|| self.site.language.clone());
		props.insert(keys::SITE_URL, self.site.url.clone());
		props.insert(keys::SITE_LANGUAGE, language);
		props.insert(keys::SITE_ID, self.site.blog_id);

		let server = ctx.server();
		let or_empty = |v: &Option<String>| v.clone().unwrap_or_default();
		props.insert(keys::USER_AGENT, or_empty(&server.user_agent));
		props.insert(keys::REMOTE_IP, or_empty(&server.remote_addr));
		props.insert(keys::ACCEPT_LANGUAGE, or_empty(&server.accept_language));
		props.insert(keys::REFERRER, or_empty(&server.referrer));
		props.insert(keys::DOCUMENT_LOCATION, server.document_location());

		props.insert(keys::IDENTITY_TYPE, identity.kind().as_tag());
		props.insert(keys::IDENTITY_ID, identity.id());

		for (key, value) in caller.into() {
			if keys::is_reserved(&key) {
				warn!(key = %key, event = event_name, "dropping reserved property key from caller");
				continue;
			}
			props.insert(key, value);
		}

		props.insert(keys::EVENT_NAME, self.full_event_name(event_name));
		props.insert(keys::TIMESTAMP, format_timestamp(timestamp_ms));

		props
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::{Principal, ServerContext};
	use proptest::prelude::*;
	use tracks_core::{AnonToken, PropertyValue};

	fn missing_required(props: &PropertyMap) -> Option<&'static str> {
		[keys::EVENT_NAME, keys::TIMESTAMP, keys::IDENTITY_TYPE, keys::IDENTITY_ID]
			.into_iter()
			.find(|key| match props.get(key) {
				Some(PropertyValue::String(s)) => s.is_empty(),
				Some(_) => false,
				None => true,
			})
	}

	fn site() -> SiteContext {
		SiteContext {
			url: "https://shop.example".to_string(),
			language: "en_US".to_string(),
			blog_id: Some(1234),
		}
	}

	fn anon() -> Identity {
		Identity::anonymous(AnonToken::generate())
	}

	#[test]
	fn assembles_all_sources() {
		let assembler = PropertyAssembler::new(site(), "wca_test_");
		let ctx = RequestContext::new(Principal::new("1")).with_server(ServerContext {
			user_agent: Some("Mozilla/5.0".to_string()),
			remote_addr: Some("203.0.113.9".to_string()),
			accept_language: Some("en-GB".to_string()),
			referrer: Some("https://shop.example/wp-admin/".to_string()),
			scheme: Some("https".to_string()),
			host: Some("shop.example".to_string()),
			request_uri: Some("/wp-admin/post.php".to_string()),
		});
		let identity = Identity::linked("998877").unwrap();

		let props = assembler.assemble(
			"update_product",
			PropertyMap::new().with("product_id", 42),
			&identity,
			&ctx,
			1_700_000_000_000,
		);

		assert_eq!(props.get("url").and_then(PropertyValue::as_str), Some("https://shop.example"));
		assert_eq!(props.get("blog_id"), Some(&PropertyValue::Int(1234)));
		assert_eq!(props.get("_via_ua").and_then(PropertyValue::as_str), Some("Mozilla/5.0"));
		assert_eq!(props.get("_via_ip").and_then(PropertyValue::as_str), Some("203.0.113.9"));
		assert_eq!(props.get("_lg").and_then(PropertyValue::as_str), Some("en-GB"));
		assert_eq!(
			props.get("_dl").and_then(PropertyValue::as_str),
			Some("https://shop.example/wp-admin/post.php")
		);
		assert_eq!(props.get("_ut").and_then(PropertyValue::as_str), Some("wpcom:user_id"));
		assert_eq!(props.get("_ui").and_then(PropertyValue::as_str), Some("998877"));
		assert_eq!(props.get("product_id"), Some(&PropertyValue::Int(42)));
		assert_eq!(
			props.get("_en").and_then(PropertyValue::as_str),
			Some("wca_test_update_product")
		);
		assert_eq!(props.get("_ts").and_then(PropertyValue::as_str), Some("1700000000000"));
	}

	#[test]
	fn missing_request_fields_are_empty_strings() {
		let props = PropertyAssembler::default().assemble(
			"ping",
			PropertyMap::new(),
			&anon(),
			&RequestContext::new(Principal::new("1")),
			1,
		);

		for key in ["_via_ua", "_via_ip", "_lg", "_dr", "_dl"] {
			assert_eq!(props.get(key).and_then(PropertyValue::as_str), Some(""), "{key}");
		}
		assert_eq!(props.get("blog_id"), Some(&PropertyValue::Null));
	}

	#[test]
	fn principal_locale_overrides_site_language() {
		let assembler = PropertyAssembler::new(site(), "");
		let ctx = RequestContext::new(Principal::new("1").with_locale("de_DE"));

		let props = assembler.assemble("ping", PropertyMap::new(), &anon(), &ctx, 1);
		assert_eq!(props.get("blog_lang").and_then(PropertyValue::as_str), Some("de_DE"));

		let props = assembler.assemble("ping", PropertyMap::new(), &anon(), &RequestContext::new(Principal::new("2")), 1);
		assert_eq!(props.get("blog_lang").and_then(PropertyValue::as_str), Some("en_US"));
	}

	#[test]
	fn caller_cannot_override_system_fields() {
		let identity = anon();
		let caller = PropertyMap::new()
			.with("_en", "hack")
			.with("_ui", "someone-else")
			.with("url", "https://override.example");

		let props = PropertyAssembler::new(site(), "wca_test_").assemble(
			"ping",
			caller,
			&identity,
			&RequestContext::new(Principal::new("1")),
			5,
		);

		assert_eq!(props.get("_en").and_then(PropertyValue::as_str), Some("wca_test_ping"));
		assert_eq!(props.get("_ui").and_then(PropertyValue::as_str), Some(identity.id()));
		// Non-reserved site keys are fair game for callers.
		assert_eq!(
			props.get("url").and_then(PropertyValue::as_str),
			Some("https://override.example")
		);
	}

	#[test]
	fn nested_caller_values_are_flattened() {
		let caller = crate::Properties::new().insert("tags", serde_json::json!(["a", "b"]));
		let props = PropertyAssembler::default().assemble(
			"ping",
			caller,
			&anon(),
			&RequestContext::new(Principal::new("1")),
			1,
		);
		assert_eq!(props.get("tags").and_then(PropertyValue::as_str), Some(r#"["a","b"]"#));
	}

	proptest! {
		#[test]
		fn reserved_caller_keys_never_win(
			key in prop_oneof![
				Just("_en".to_string()),
				Just("_ts".to_string()),
				Just("_ut".to_string()),
				Just("_ui".to_string()),
				Just("_via_ip".to_string()),
				"_[a-z]{1,8}",
			],
			value in "[a-z0-9]{0,16}",
		) {
			let marked = format!("caller-{value}");
			let identity = anon();
			let props = PropertyAssembler::default().assemble(
				"ping",
				PropertyMap::new().with(key.clone(), marked.clone()),
				&identity,
				&RequestContext::new(Principal::new("1")),
				42,
			);

			prop_assert_ne!(props.get(&key).and_then(PropertyValue::as_str), Some(marked.as_str()));
			prop_assert_eq!(props.get("_en").and_then(PropertyValue::as_str), Some("wca_test_ping"));
			prop_assert_eq!(props.get("_ui").and_then(PropertyValue::as_str), Some(identity.id()));
		}

		#[test]
		fn required_fields_always_present(
			name in "[a-z][a-z0-9_]{0,20}",
			ts in 0i64..4_102_444_800_000,
			caller in proptest::collection::vec(("[a-z_][a-z0-9_]{0,10}", "[ -~]{0,12}"), 0..8),
		) {
			let caller: PropertyMap = caller.into_iter().collect();
			let props = PropertyAssembler::default().assemble(
				&name,
				caller,
				&anon(),
				&RequestContext::new(Principal::new("1")),
				ts,
			);
			prop_assert_eq!(missing_required(&props), None);
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rust SDK for recording Tracks usage-analytics events.
//!
//! An event goes through four stages:
//!
//! 1. **Identity resolution**: the principal becomes a linked account id or a
//!    persisted anonymous token ([`IdentityResolver`]).
//! 2. **Property assembly**: site, request, identity and caller properties are
//!    merged into one flat map ([`PropertyAssembler`]).
//! 3. **Encoding**: the map becomes a pixel URL ([`EventEncoder`]).
//! 4. **Delivery**: one GET to the collector ([`DeliveryClient`]).
//!
//! [`Tracker`] runs the pipeline after checking consent.
//!
//! # Example
//!
//! ```ignore
//! use tracks::{Principal, Properties, RequestContext, Tracker};
//!
//! let tracker = Tracker::builder()
//!     .allow_tracking(true)
//!     .build()?;
//!
//! let ctx = RequestContext::new(Principal::new("42"));
//! tracker
//!     .record_event(&ctx, "update_product", Properties::new().insert("product_id", 42))
//!     .await?;
//! ```

pub mod assembler;
pub mod client;
pub mod consent;
pub mod context;
pub mod delivery;
pub mod encoder;
pub mod error;
pub mod identity;
pub mod linking;
pub mod properties;
pub mod store;
pub mod subscriptions;

pub use assembler::{PropertyAssembler, SiteContext, DEFAULT_EVENT_PREFIX};
pub use client::{EventPreview, Tracker, TrackerBuilder};
pub use consent::{ConsentGate, ConsentPolicy, ConsentProvider, StaticConsent};
pub use context::{CookieSink, MemoryCookieSink, NoCookies, Principal, RequestContext, ServerContext};
pub use delivery::DeliveryClient;
pub use encoder::{EventEncoder, DEFAULT_ENDPOINT, DEFAULT_MAX_URL_LENGTH};
pub use error::{
	ConsentError, CookieError, EncodingError, LinkingError, Result, StoreError, TracksError,
};
pub use identity::IdentityResolver;
pub use linking::{AccountLinkingProvider, NullAccountLinking, SharedAccountLinking};
pub use properties::Properties;
pub use store::{IdentityStore, MemoryIdentityStore, ANON_ID_KEY, LINKED_ID_KEY};
pub use subscriptions::{ProductUpdatedSubscriber, Subscriber, Subscriptions, EDIT_POST};

pub use tracks_common_http::{user_agent, PixelPolicy};
pub use tracks_core::{
	AnonToken, DeliveryResult, ErrorKind, Event, Identity, IdentityType, NotTrackedReason,
	PropertyMap, PropertyValue, RecordOutcome,
};

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracker client: the public entry point for recording events.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use tracks_common_http::PixelPolicy;
use tracks_core::{
	timestamp_ms_now, validate_event_name, DeliveryResult, Event, Identity, NotTrackedReason,
	PropertyMap, RecordOutcome,
};
use url::Url;

use crate::assembler::{PropertyAssembler, SiteContext, DEFAULT_EVENT_PREFIX};
use crate::consent::{ConsentGate, ConsentPolicy, ConsentProvider, StaticConsent};
use crate::context::RequestContext;
use crate::delivery::DeliveryClient;
use crate::encoder::{EventEncoder, DEFAULT_ENDPOINT, DEFAULT_MAX_URL_LENGTH};
use crate::error::{EncodingError, Result, TracksError};
use crate::identity::IdentityResolver;
use crate::linking::{NullAccountLinking, SharedAccountLinking};
use crate::store::{IdentityStore, MemoryIdentityStore};

/// SDK version for identification.
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builder for constructing a [`Tracker`].
pub struct TrackerBuilder {
	endpoint: String,
	policy: PixelPolicy,
	max_url_length: usize,
	event_prefix: String,
	site: SiteContext,
	store: Option<Arc<dyn IdentityStore>>,
	linking: Option<SharedAccountLinking>,
	consent: Option<Arc<dyn ConsentProvider>>,
	consent_policy: Option<ConsentPolicy>,
	surface_encoding_errors: bool,
	user_agent: Option<String>,
}

impl TrackerBuilder {
	/// Creates a new builder with default settings.
	///
	/// Without further configuration the tracker uses an in-memory identity
	/// store, no account linking, and tracking disabled.
	pub fn new() -> Self {
		Self {
			endpoint: DEFAULT_ENDPOINT.to_string(),
			policy: PixelPolicy::default(),
			max_url_length: DEFAULT_MAX_URL_LENGTH,
			event_prefix: DEFAULT_EVENT_PREFIX.to_string(),
			site: SiteContext::default(),
			store: None,
			linking: None,
			consent: None,
			consent_policy: None,
			surface_encoding_errors: cfg!(debug_assertions),
			user_agent: None,
		}
	}

	/// Sets the collector endpoint.
	///
	/// Default: `https://pixel.wp.com/t.gif`
	pub fn endpoint(mut self, url: impl Into<String>) -> Self {
		self.endpoint = url.into();
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.policy.timeout = timeout;
		self
	}

	pub fn max_redirects(mut self, max: usize) -> Self {
		self.policy.max_redirects = max;
		self
	}

	pub fn max_url_length(mut self, max: usize) -> Self {
		self.max_url_length = max;
		self
	}

	/// Sets the prefix prepended to every event name.
	pub fn event_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.event_prefix = prefix.into();
		self
	}

	pub fn site(mut self, site: SiteContext) -> Self {
		self.site = site;
		self
	}

	pub fn identity_store(mut self, store: Arc<dyn IdentityStore>) -> Self {
		self.store = Some(store);
		self
	}

	pub fn account_linking(mut self, linking: SharedAccountLinking) -> Self {
		self.linking = Some(linking);
		self
	}

	pub fn consent(mut self, provider: Arc<dyn ConsentProvider>) -> Self {
		self.consent = Some(provider);
		self
	}

	/// Shorthand for a fixed opt-in answer.
	pub fn allow_tracking(self, allowed: bool) -> Self {
		self.consent(Arc::new(StaticConsent(allowed)))
	}

	pub fn consent_policy(mut self, policy: ConsentPolicy) -> Self {
		self.consent_policy = Some(policy);
		self
	}

	/// Return encoding failures as errors instead of a failed delivery result.
	///
	/// Defaults to on in debug builds.
	pub fn surface_encoding_errors(mut self, surface: bool) -> Self {
		self.surface_encoding_errors = surface;
		self
	}

	/// Overrides the User-Agent sent with pixel requests.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}

	/// Builds the Tracker.
	pub fn build(self) -> Result<Tracker> {
		let endpoint = parse_endpoint(&self.endpoint)?;
		// Prefixed names must still validate.
		if !self.event_prefix.is_empty() {
			validate_event_name(&self.event_prefix)?;
		}
		let delivery = DeliveryClient::new(self.policy, self.user_agent.as_deref())?;

		let store = self
			.store
			.unwrap_or_else(|| Arc::new(MemoryIdentityStore::new()));
		let linking = self.linking.unwrap_or_else(|| Arc::new(NullAccountLinking));
		let mut consent = ConsentGate::new(
			self.consent
				.unwrap_or_else(|| Arc::new(StaticConsent(false))),
		);
		if let Some(policy) = self.consent_policy {
			consent = consent.with_policy(policy);
		}

		info!(
			endpoint = %endpoint,
			timeout_ms = u64::try_from(self.policy.timeout.as_millis()).unwrap_or(u64::MAX),
			event_prefix = %self.event_prefix,
			sdk_version = SDK_VERSION,
			"Tracks client initialized"
		);

		let inner = TrackerInner {
			consent,
			resolver: IdentityResolver::new(store, linking),
			assembler: PropertyAssembler::new(self.site, self.event_prefix),
			encoder: EventEncoder::new(endpoint, self.max_url_length),
			delivery,
			surface_encoding_errors: self.surface_encoding_errors,
		};

		Ok(Tracker {
			inner: Arc::new(inner),
		})
	}
}

impl Default for TrackerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

fn parse_endpoint(raw: &str) -> Result<Url> {
	let url = Url::parse(raw).map_err(|e| TracksError::InvalidEndpoint(format!("{raw}: {e}")))?;
	match url.scheme() {
		"http" | "https" => Ok(url),
		other => Err(TracksError::InvalidEndpoint(format!(
			"{raw}: unsupported scheme {other}"
		))),
	}
}

struct TrackerInner {
	consent: ConsentGate,
	resolver: IdentityResolver,
	assembler: PropertyAssembler,
	encoder: EventEncoder,
	delivery: DeliveryClient,
	surface_encoding_errors: bool,
}

/// An event that was assembled and encoded but not sent.
#[derive(Debug, Clone)]
pub struct EventPreview {
	pub event: Event,
	pub url: Url,
}

/// Records usage events for principals.
///
/// Cheap to clone; clones share the HTTP client and collaborators.
///
/// # Example
///
/// ```ignore
/// use tracks::{Principal, Properties, RequestContext, Tracker};
///
/// let tracker = Tracker::builder()
///     .allow_tracking(true)
///     .build()?;
///
/// let ctx = RequestContext::new(Principal::new("42"));
/// let outcome = tracker
///     .record_event(&ctx, "update_product", Properties::new().insert("product_id", 42))
///     .await?;
/// ```
#[derive(Clone)]
pub struct Tracker {
	inner: Arc<TrackerInner>,
}

impl Tracker {
	pub fn builder() -> TrackerBuilder {
		TrackerBuilder::new()
	}

	/// Records one event for the context's principal.
	///
	/// Every expected failure comes back as `Ok`: suppressed events as
	/// [`RecordOutcome::NotTracked`], delivery problems inside
	/// [`RecordOutcome::Delivered`]. `Err` is only returned for encoding
	/// failures when `surface_encoding_errors` is on.
	pub async fn record_event(
		&self,
		ctx: &RequestContext,
		event_name: &str,
		properties: impl Into<PropertyMap>,
	) -> Result<RecordOutcome> {
		let principal_id = ctx.principal().id.as_str();

		if ctx.principal().automated {
			debug!(principal_id, event = event_name, "automated principal, not tracking");
			return Ok(RecordOutcome::not_tracked(NotTrackedReason::AutomatedPrincipal));
		}

		match self.inner.consent.check().await {
			Ok(true) => {}
			Ok(false) => {
				debug!(event = event_name, "tracking not consented");
				return Ok(RecordOutcome::not_tracked(NotTrackedReason::ConsentDenied));
			}
			Err(e) => {
				warn!(error = %e, event = event_name, "consent check failed, dropping event");
				return Ok(RecordOutcome::not_tracked(
					NotTrackedReason::CollaboratorUnavailable,
				));
			}
		}

		let identity = match self.inner.resolver.resolve(ctx).await {
			Ok(identity) => identity,
			Err(e) => {
				warn!(error = %e, principal_id, event = event_name, "identity resolution failed, dropping event");
				return Ok(RecordOutcome::not_tracked(
					NotTrackedReason::CollaboratorUnavailable,
				));
			}
		};

		let (event, url) = match self.build_event(ctx, event_name, properties.into(), &identity) {
			Ok(built) => built,
			Err(e) if self.inner.surface_encoding_errors => {
				error!(error = %e, event = event_name, "failed to encode event");
				return Err(e.into());
			}
			Err(e) => {
				warn!(error = %e, event = event_name, "failed to encode event, dropping");
				return Ok(RecordOutcome::delivered(DeliveryResult::encoding_error()));
			}
		};

		let result = self.inner.delivery.deliver(&url).await;
		debug!(
			event = event.name(),
			ok = result.ok,
			status = result.status_code,
			"event recorded"
		);
		Ok(RecordOutcome::delivered(result))
	}

	/// Assembles and encodes an event without sending it.
	///
	/// Gating is skipped and every failure is returned as an error. Nothing is
	/// persisted: a principal without a stored identity is previewed with a
	/// throwaway one.
	pub async fn preview_event(
		&self,
		ctx: &RequestContext,
		event_name: &str,
		properties: impl Into<PropertyMap>,
	) -> Result<EventPreview> {
		let identity = self.inner.resolver.peek(ctx).await?;
		let (event, url) = self.build_event(ctx, event_name, properties.into(), &identity)?;
		Ok(EventPreview { event, url })
	}

	fn build_event(
		&self,
		ctx: &RequestContext,
		event_name: &str,
		properties: PropertyMap,
		identity: &Identity,
	) -> std::result::Result<(Event, Url), EncodingError> {
		validate_event_name(event_name)?;

		let timestamp_ms = timestamp_ms_now();
		let props = self
			.inner
			.assembler
			.assemble(event_name, properties, identity, ctx, timestamp_ms);
		let event = Event::new(
			self.inner.assembler.full_event_name(event_name),
			props,
			timestamp_ms,
		);
		let url = self.inner.encoder.encode(&event, timestamp_ms_now())?;
		Ok((event, url))
	}

	pub fn endpoint(&self) -> &Url {
		self.inner.encoder.endpoint()
	}
}

impl std::fmt::Debug for Tracker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Tracker")
			.field("endpoint", &self.inner.encoder.endpoint().as_str())
			.field("consent", &self.inner.consent)
			.field("surface_encoding_errors", &self.inner.surface_encoding_errors)
			.finish_non_exhaustive()
	}
}

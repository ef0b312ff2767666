// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by each source.

use serde::{Deserialize, Serialize};

use crate::sections::{
	CollectorConfigLayer, LoggingConfigLayer, SiteConfigLayer, StoreConfigLayer,
	TrackingConfigLayer,
};

/// One source's view of the configuration. Unset fields leave lower-precedence
/// values in place when merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TracksConfigLayer {
	#[serde(default)]
	pub collector: Option<CollectorConfigLayer>,
	#[serde(default)]
	pub tracking: Option<TrackingConfigLayer>,
	#[serde(default)]
	pub site: Option<SiteConfigLayer>,
	#[serde(default)]
	pub store: Option<StoreConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

fn merge_section<T: Default>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	if let Some(other) = other {
		merge(base.get_or_insert_with(T::default), other);
	}
}

impl TracksConfigLayer {
	pub fn merge(&mut self, other: TracksConfigLayer) {
		merge_section(&mut self.collector, other.collector, CollectorConfigLayer::merge);
		merge_section(&mut self.tracking, other.tracking, TrackingConfigLayer::merge);
		merge_section(&mut self.site, other.site, SiteConfigLayer::merge);
		merge_section(&mut self.store, other.store, StoreConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

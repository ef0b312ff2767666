// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod collector;
mod logging;
mod site;
mod store;
mod tracking;

pub use collector::{CollectorConfig, CollectorConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use site::{SiteConfig, SiteConfigLayer};
pub use store::{StoreConfig, StoreConfigLayer};
pub use tracking::{TrackingConfig, TrackingConfigLayer};

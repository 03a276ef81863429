// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Read-side canary aggregation across member clusters.

pub mod fetcher;
pub mod target;

pub use fetcher::{CanaryFetcher, CanaryListing, ListCanariesOptions};
pub use target::TargetWorkload;

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource types read from member clusters.

pub mod canary;

pub use canary::{Canary, CanarySpec, CanaryStatus, LocalObjectReference};

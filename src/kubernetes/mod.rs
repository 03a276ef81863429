// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes plumbing: member cluster clients, clustered listing and CRD discovery.

pub mod client;
pub mod crd;
pub mod pagination;
pub mod pool;

pub use client::{create_cluster_clients, create_cluster_clients_from_yaml};
pub use crd::{CapabilityCheck, CrdCache, CrdLister};
pub use pagination::PageToken;
pub use pool::{ClusterPool, ClusteredList, ClusteredListOptions};

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Canary listing across all member clusters.

use crate::constants::flagger::CANARY_CRD_NAME;
use crate::error::{ClusterError, ClusterErrorKind, Result};
use crate::kubernetes::{CapabilityCheck, ClusterPool, ClusteredListOptions};
use crate::types::Canary;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Default)]
pub struct ListCanariesOptions {
    /// Namespace to list in, all namespaces when empty
    pub namespace: String,
    /// Page size per cluster, 0 for the server default
    pub page_size: u32,
    /// Token from a previous listing, empty for the first page
    pub page_token: String,
}

/// Outcome of a listing: whatever the reachable clusters returned plus one
/// error record per cluster that failed or lacks the Flagger CRD
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanaryListing {
    pub canaries: BTreeMap<String, Vec<Canary>>,
    pub next_page_token: String,
    pub errors: Vec<ClusterError>,
}

impl CanaryListing {
    pub fn total(&self) -> usize {
        self.canaries.values().map(Vec::len).sum()
    }

    pub fn errors_for<'a>(&'a self, cluster: &'a str) -> impl Iterator<Item = &'a ClusterError> {
        self.errors.iter().filter(move |e| e.cluster == cluster)
    }
}

/// Reads canaries and their targets from the clusters of a pool
pub struct CanaryFetcher {
    pool: Arc<ClusterPool>,
    crds: Arc<dyn CapabilityCheck>,
}

impl CanaryFetcher {
    pub fn new(pool: Arc<ClusterPool>, crds: Arc<dyn CapabilityCheck>) -> Self {
        Self { pool, crds }
    }

    pub(crate) fn pool(&self) -> &ClusterPool {
        &self.pool
    }

    /// List canaries on every cluster of the pool.
    ///
    /// Unreachable clusters and clusters without the Flagger CRD are reported
    /// in [`CanaryListing::errors`]; the latter also get an empty entry so
    /// nothing cached by a stale client is returned for them. Only errors that
    /// prevent listing altogether are returned as `Err`.
    ///
    /// The CRD check runs alongside the listing so a hanging cluster costs one
    /// timeout, not one per cluster.
    #[instrument(skip(self, options), fields(namespace = %options.namespace, page_size = options.page_size))]
    pub async fn list_canaries(&self, options: &ListCanariesOptions) -> Result<CanaryListing> {
        let opts = ClusteredListOptions {
            limit: options.page_size,
            page_token: options.page_token.clone(),
            ignore_not_found: true,
        };

        let clusters: Vec<String> = self.pool.clients().await.into_keys().collect();
        let (listed, available) = tokio::join!(
            self.pool.clustered_list::<Canary>(&options.namespace, &opts),
            self.crds.available_on(&clusters, CANARY_CRD_NAME),
        );

        let mut clist = listed?;
        let mut errors = clist.take_errors().errors;
        let next_page_token = clist.continue_token().to_string();
        let mut canaries = BTreeMap::new();

        for (cluster, lists) in clist.into_lists() {
            let has_flagger = match available.get(&cluster) {
                Some(has_flagger) => *has_flagger,
                // Joined the pool after the check started
                None => self.crds.is_available(&cluster, CANARY_CRD_NAME).await,
            };

            if !has_flagger {
                debug!("Flagger is not available on cluster '{}'", cluster);
                errors.push(ClusterError {
                    cluster: cluster.clone(),
                    kind: ClusterErrorKind::CapabilityMissing {
                        crd: CANARY_CRD_NAME.to_string(),
                    },
                });
                canaries.insert(cluster, Vec::new());
                continue;
            }

            let items: Vec<Canary> = lists.into_iter().flat_map(|list| list.items).collect();
            canaries.insert(cluster, items);
        }

        let listing = CanaryListing {
            canaries,
            next_page_token,
            errors,
        };

        info!(
            "Listed {} canaries from {} clusters, {} errors",
            listing.total(),
            listing.canaries.len(),
            listing.errors.len()
        );

        Ok(listing)
    }
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability cache across member clusters

use crate::error::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Lists the CRDs installed on each member cluster
#[async_trait]
pub trait CrdLister: Send + Sync {
    /// Clusters currently known
    async fn clusters(&self) -> Vec<String>;

    /// Names of all CRDs installed on `cluster`
    async fn list_crd_names(&self, cluster: &str) -> Result<Vec<String>>;
}

/// Answers whether a CRD is installed on a cluster
#[async_trait]
pub trait CapabilityCheck: Send + Sync {
    async fn is_available(&self, cluster: &str, name: &str) -> bool;

    /// Availability of `name` on each of `clusters`, answered from a single
    /// refresh rather than one per cluster
    async fn available_on(&self, clusters: &[String], name: &str) -> HashMap<String, bool> {
        let mut available = HashMap::new();
        for cluster in clusters {
            available.insert(cluster.clone(), self.is_available(cluster, name).await);
        }
        available
    }
}

#[derive(Default)]
struct CacheState {
    crds: HashMap<String, HashSet<String>>,
    refreshed_at: Option<Instant>,
}

impl CacheState {
    fn has(&self, cluster: &str, name: &str) -> bool {
        self.crds
            .get(cluster)
            .is_some_and(|crds| crds.contains(name))
    }
}

/// Per-cluster set of installed CRD names.
///
/// Lookups refresh the cache first unless the last refresh is younger than the
/// refresh interval. A cluster that cannot be listed keeps whatever was cached
/// for it before, so an unreachable cluster looks the same as one without the
/// CRD until it has been listed successfully once.
pub struct CrdCache {
    lister: Arc<dyn CrdLister>,
    state: Mutex<CacheState>,
    refresh_interval: Duration,
}

impl CrdCache {
    /// Cache that refreshes on every lookup
    pub fn new(lister: Arc<dyn CrdLister>) -> Self {
        Self::with_refresh_interval(lister, Duration::ZERO)
    }

    pub fn with_refresh_interval(lister: Arc<dyn CrdLister>, refresh_interval: Duration) -> Self {
        Self {
            lister,
            state: Mutex::new(CacheState::default()),
            refresh_interval,
        }
    }

    /// Re-list CRDs on every known cluster, replacing each cluster's entry on
    /// success. Failures are logged and otherwise ignored.
    pub async fn refresh(&self) {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await;
    }

    /// Cached CRD names for `cluster`, without refreshing
    pub async fn cached(&self, cluster: &str) -> Option<HashSet<String>> {
        self.state.lock().await.crds.get(cluster).cloned()
    }

    #[instrument(skip(self, state))]
    async fn refresh_locked(&self, state: &mut CacheState) {
        let clusters = self.lister.clusters().await;
        let lister = &self.lister;

        let results = join_all(clusters.iter().map(|cluster| async move {
            (cluster, lister.list_crd_names(cluster).await)
        }))
        .await;

        for (cluster, result) in results {
            match result {
                Ok(names) => {
                    debug!("Cluster '{}' has {} CRDs", cluster, names.len());
                    state.crds.insert(cluster.clone(), names.into_iter().collect());
                }
                Err(e) => {
                    warn!(
                        "Failed to list CRDs on cluster '{}', keeping cached entry: {}",
                        cluster, e
                    );
                }
            }
        }

        state.crds.retain(|cluster, _| clusters.contains(cluster));
        state.refreshed_at = Some(Instant::now());
    }

    fn is_stale(&self, state: &CacheState) -> bool {
        match state.refreshed_at {
            Some(at) => at.elapsed() >= self.refresh_interval,
            None => true,
        }
    }
}

#[async_trait]
impl CapabilityCheck for CrdCache {
    async fn is_available(&self, cluster: &str, name: &str) -> bool {
        let mut state = self.state.lock().await;

        if self.is_stale(&state) {
            self.refresh_locked(&mut state).await;
        }

        state.has(cluster, name)
    }

    async fn available_on(&self, clusters: &[String], name: &str) -> HashMap<String, bool> {
        let mut state = self.state.lock().await;

        if self.is_stale(&state) {
            self.refresh_locked(&mut state).await;
        }

        clusters
            .iter()
            .map(|cluster| (cluster.clone(), state.has(cluster, name)))
            .collect()
    }
}

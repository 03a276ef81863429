// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Kubeconfig file to read clusters from, standard resolution when unset
    pub kubeconfig_path: Option<PathBuf>,
    /// Kubeconfig contexts to include in the pool, all contexts when empty
    pub contexts: Vec<String>,
    /// Upper bound for a single cluster's request
    pub cluster_timeout: Duration,
    /// Minimum age of the CRD cache before it is refreshed again
    pub crd_refresh_interval: Duration,
    pub namespace: String,
    pub page_size: u32,
    pub page_token: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let kubeconfig_path = lookup("KUBECONFIG_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let contexts = lookup("LOOKOUT_CONTEXTS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let cluster_timeout = match lookup("LOOKOUT_CLUSTER_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .context("LOOKOUT_CLUSTER_TIMEOUT_SECS must be a number of seconds")?,
            None => defaults::CLUSTER_TIMEOUT_SECS,
        };

        let crd_refresh = match lookup("LOOKOUT_CRD_REFRESH_SECS") {
            Some(v) => v
                .parse()
                .context("LOOKOUT_CRD_REFRESH_SECS must be a number of seconds")?,
            None => defaults::CRD_REFRESH_SECS,
        };

        let page_size = match lookup("LOOKOUT_PAGE_SIZE") {
            Some(v) => v.parse().context("LOOKOUT_PAGE_SIZE must be a number")?,
            None => 0,
        };

        Ok(Config {
            kubeconfig_path,
            contexts,
            cluster_timeout: Duration::from_secs(cluster_timeout),
            crd_refresh_interval: Duration::from_secs(crd_refresh),
            namespace: lookup("LOOKOUT_NAMESPACE").unwrap_or_default(),
            page_size,
            page_token: lookup("LOOKOUT_PAGE_TOKEN").unwrap_or_default(),
        })
    }
}

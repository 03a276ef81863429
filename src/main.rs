// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lookout::canaries::{CanaryFetcher, ListCanariesOptions};
use lookout::config::Config;
use lookout::kubernetes::{ClusterPool, CrdCache};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: contexts={:?}, cluster_timeout={:?}, crd_refresh_interval={:?}",
        config.contexts, config.cluster_timeout, config.crd_refresh_interval
    );

    let pool = Arc::new(
        ClusterPool::from_config(&config)
            .await
            .context("Failed to build cluster pool")?,
    );
    let crds = Arc::new(CrdCache::with_refresh_interval(
        pool.clone(),
        config.crd_refresh_interval,
    ));
    let fetcher = CanaryFetcher::new(pool, crds);

    let listing = fetcher
        .list_canaries(&ListCanariesOptions {
            namespace: config.namespace.clone(),
            page_size: config.page_size,
            page_token: config.page_token.clone(),
        })
        .await
        .context("Failed to list canaries")?;

    for error in &listing.errors {
        warn!("{}", error);
    }

    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

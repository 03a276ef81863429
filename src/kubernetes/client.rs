// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Member cluster client creation from kubeconfig contexts

use crate::config::Config;
use crate::error::{LookoutError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Create one client per kubeconfig context selected by the configuration
#[instrument(skip(config))]
pub async fn create_cluster_clients(config: &Config) -> Result<BTreeMap<String, Client>> {
    let kubeconfig = match &config.kubeconfig_path {
        Some(path) => {
            info!("Reading kubeconfig from {}", path.display());
            Kubeconfig::read_from(path)
        }
        None => Kubeconfig::read(),
    }
    .map_err(|e| LookoutError::KubeconfigError(format!("Failed to read kubeconfig: {}", e)))?;

    create_clients_from_kubeconfig(kubeconfig, &config.contexts).await
}

/// Create one client per context of a kubeconfig given as YAML text
pub async fn create_cluster_clients_from_yaml(
    kubeconfig: &str,
    contexts: &[String],
) -> Result<BTreeMap<String, Client>> {
    create_clients_from_kubeconfig(parse_kubeconfig(kubeconfig)?, contexts).await
}

fn parse_kubeconfig(kubeconfig: &str) -> Result<Kubeconfig> {
    serde_yaml::from_str(kubeconfig)
        .map_err(|e| LookoutError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))
}

/// Contexts to build clients for: all of them, or the requested ones which
/// must all exist
fn select_contexts(kubeconfig: &Kubeconfig, wanted: &[String]) -> Result<Vec<String>> {
    let available: Vec<String> = kubeconfig.contexts.iter().map(|c| c.name.clone()).collect();

    if wanted.is_empty() {
        return Ok(available);
    }

    if let Some(missing) = wanted.iter().find(|w| !available.contains(w)) {
        return Err(LookoutError::KubeconfigError(format!(
            "Context '{}' not found in kubeconfig",
            missing
        )));
    }

    Ok(wanted.to_vec())
}

async fn create_clients_from_kubeconfig(
    kubeconfig: Kubeconfig,
    contexts: &[String],
) -> Result<BTreeMap<String, Client>> {
    let mut clients = BTreeMap::new();

    for context in select_contexts(&kubeconfig, contexts)? {
        debug!("Creating client for context '{}'", context);

        let options = KubeConfigOptions {
            context: Some(context.clone()),
            ..Default::default()
        };

        let client_config = kube::Config::from_custom_kubeconfig(kubeconfig.clone(), &options)
            .await
            .map_err(|e| {
                LookoutError::KubeconfigError(format!(
                    "Failed to create config for context {}: {}",
                    context, e
                ))
            })?;

        let client = Client::try_from(client_config).map_err(|e| {
            LookoutError::KubeconfigError(format!(
                "Failed to create client for context {}: {}",
                context, e
            ))
        })?;

        clients.insert(context, client);
    }

    info!("Created clients for {} clusters", clients.len());
    Ok(clients)
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pool of member cluster clients with fan-out list and scoped get.

use crate::config::Config;
use crate::error::{ClusterErrorKind, ClusteredListError, LookoutError, Result};
use crate::kubernetes::client::create_cluster_clients;
use crate::kubernetes::crd::CrdLister;
use crate::kubernetes::pagination::PageToken;
use async_trait::async_trait;
use futures::future::join_all;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{ListParams, ObjectList},
    Api, Client, Resource,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Options applied to every cluster of a clustered list
#[derive(Debug, Clone, Default)]
pub struct ClusteredListOptions {
    /// Page size per cluster, 0 leaves it to the server
    pub limit: u32,
    /// Token returned by a previous call, empty for the first page
    pub page_token: String,
    /// Treat a 404 for the resource type as an empty result
    pub ignore_not_found: bool,
}

/// Pages collected per cluster by [`ClusterPool::clustered_list`], together
/// with the clusters that could not be listed
#[derive(Debug)]
pub struct ClusteredList<K: Clone> {
    lists: BTreeMap<String, Vec<ObjectList<K>>>,
    continue_token: String,
    errors: ClusteredListError,
}

impl<K: Clone> ClusteredList<K> {
    pub fn new() -> Self {
        Self {
            lists: BTreeMap::new(),
            continue_token: String::new(),
            errors: ClusteredListError::default(),
        }
    }

    pub fn lists(&self) -> &BTreeMap<String, Vec<ObjectList<K>>> {
        &self.lists
    }

    pub fn into_lists(self) -> BTreeMap<String, Vec<ObjectList<K>>> {
        self.lists
    }

    /// Token resuming the whole clustered query, empty when every cluster is done
    pub fn continue_token(&self) -> &str {
        &self.continue_token
    }

    /// Clusters that failed, empty when every cluster answered
    pub fn errors(&self) -> &ClusteredListError {
        &self.errors
    }

    /// Move the per-cluster failures out, leaving none behind
    pub fn take_errors(&mut self) -> ClusteredListError {
        std::mem::take(&mut self.errors)
    }

    fn add_page(&mut self, cluster: String, list: ObjectList<K>) {
        self.lists.entry(cluster).or_default().push(list);
    }

    fn add_empty(&mut self, cluster: String) {
        self.lists.entry(cluster).or_default();
    }
}

/// Named `kube::Client`s, one per member cluster
pub struct ClusterPool {
    clients: RwLock<BTreeMap<String, Client>>,
    timeout: Duration,
}

impl ClusterPool {
    /// Create an empty pool. `timeout` bounds every request to a single cluster.
    pub fn new(timeout: Duration) -> Self {
        Self {
            clients: RwLock::new(BTreeMap::new()),
            timeout,
        }
    }

    /// Build a pool with one client per kubeconfig context selected by `config`
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = Self::new(config.cluster_timeout);
        for (name, client) in create_cluster_clients(config).await? {
            pool.add_cluster(name, client).await;
        }
        Ok(pool)
    }

    pub async fn add_cluster(&self, name: impl Into<String>, client: Client) {
        let name = name.into();
        info!("Adding cluster '{}' to pool", name);
        self.clients.write().await.insert(name, client);
    }

    pub async fn remove_cluster(&self, name: &str) -> Option<Client> {
        info!("Removing cluster '{}' from pool", name);
        self.clients.write().await.remove(name)
    }

    /// Snapshot of the clusters currently in the pool
    pub async fn clients(&self) -> BTreeMap<String, Client> {
        self.clients.read().await.clone()
    }

    pub async fn client(&self, cluster: &str) -> Result<Client> {
        self.clients
            .read()
            .await
            .get(cluster)
            .cloned()
            .ok_or_else(|| LookoutError::UnknownCluster(cluster.to_string()))
    }

    /// List `K` on every cluster concurrently.
    ///
    /// With a page token only the clusters recorded in it are queried, each
    /// resuming from its own continue token. Clusters that fail are recorded in
    /// [`ClusteredList::errors`] next to the pages of the others, and stay in the
    /// continue token so the next page retries them. An `Err` means nothing was
    /// listed.
    #[instrument(skip(self, opts), fields(limit = opts.limit))]
    pub async fn clustered_list<K>(
        &self,
        namespace: &str,
        opts: &ClusteredListOptions,
    ) -> Result<ClusteredList<K>>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug + Send + 'static,
        <K as Resource>::DynamicType: Default,
    {
        let resume = PageToken::decode(&opts.page_token)?;

        let targets: Vec<(String, Client, Option<String>)> = self
            .clients()
            .await
            .into_iter()
            .filter(|(cluster, _)| {
                resume
                    .as_ref()
                    .map_or(true, |token| token.contains(cluster))
            })
            .map(|(cluster, client)| {
                let from = resume
                    .as_ref()
                    .and_then(|token| token.get(&cluster))
                    .map(String::from);
                (cluster, client, from)
            })
            .collect();

        debug!("Listing across {} clusters", targets.len());

        let per_cluster_timeout = self.timeout;
        let calls = targets.into_iter().map(|(cluster, client, from)| {
            let api: Api<K> = if namespace.is_empty() {
                Api::all(client)
            } else {
                Api::namespaced(client, namespace)
            };

            let mut lp = ListParams::default();
            if opts.limit > 0 {
                lp = lp.limit(opts.limit);
            }
            if let Some(from) = &from {
                lp = lp.continue_token(from);
            }

            async move {
                let result = timeout(per_cluster_timeout, api.list(&lp)).await;
                (cluster, from, result)
            }
        });

        let mut clist = ClusteredList::new();
        let mut next = PageToken::default();

        for (cluster, from, result) in join_all(calls).await {
            match result {
                Ok(Ok(list)) => {
                    debug!("Cluster '{}' returned {} items", cluster, list.items.len());
                    next.set(&cluster, list.metadata.continue_.as_deref());
                    clist.add_page(cluster, list);
                }
                Ok(Err(kube::Error::Api(err))) if err.code == 404 && opts.ignore_not_found => {
                    debug!("Resource type not found on cluster '{}', ignoring", cluster);
                    clist.add_empty(cluster);
                }
                Ok(Err(e)) => {
                    warn!("List failed on cluster '{}': {}", cluster, e);
                    next.retry(&cluster, from.as_deref());
                    clist.errors.push(cluster, ClusterErrorKind::Transport(e));
                }
                Err(_) => {
                    warn!(
                        "List on cluster '{}' timed out after {:?}",
                        cluster, per_cluster_timeout
                    );
                    next.retry(&cluster, from.as_deref());
                    clist
                        .errors
                        .push(cluster, ClusterErrorKind::Timeout(per_cluster_timeout));
                }
            }
        }

        clist.continue_token = next.encode();
        Ok(clist)
    }

    /// Get a single namespaced object from one cluster
    #[instrument(skip(self))]
    pub async fn get<K>(&self, cluster: &str, namespace: &str, name: &str) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client(cluster).await?, namespace);

        match timeout(self.timeout, api.get(name)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(LookoutError::Timeout {
                cluster: cluster.to_string(),
                after: self.timeout,
            }),
        }
    }
}

#[async_trait]
impl CrdLister for ClusterPool {
    async fn clusters(&self) -> Vec<String> {
        self.clients.read().await.keys().cloned().collect()
    }

    async fn list_crd_names(&self, cluster: &str) -> Result<Vec<String>> {
        let api: Api<CustomResourceDefinition> = Api::all(self.client(cluster).await?);

        let list = timeout(self.timeout, api.list_metadata(&ListParams::default()))
            .await
            .map_err(|_| LookoutError::Timeout {
                cluster: cluster.to_string(),
                after: self.timeout,
            })??;

        Ok(list
            .items
            .into_iter()
            .filter_map(|crd| crd.metadata.name)
            .collect())
    }
}

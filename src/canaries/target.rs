// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resolution of the workload a canary rolls out.

use super::CanaryFetcher;
use crate::constants::targets;
use crate::error::{LookoutError, Result};
use crate::types::Canary;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use kube::ResourceExt;
use serde::Serialize;
use tracing::{debug, instrument};

/// Workload referenced by a canary's `targetRef`
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TargetWorkload {
    Deployment(Deployment),
    DaemonSet(DaemonSet),
}

impl TargetWorkload {
    pub fn name(&self) -> String {
        match self {
            TargetWorkload::Deployment(d) => d.name_any(),
            TargetWorkload::DaemonSet(d) => d.name_any(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TargetWorkload::Deployment(_) => targets::DEPLOYMENT,
            TargetWorkload::DaemonSet(_) => targets::DAEMON_SET,
        }
    }
}

impl CanaryFetcher {
    /// Get the target workload of `canary` from `cluster_name`. The target
    /// always lives in the canary's namespace.
    #[instrument(skip(self, canary), fields(canary = %canary.name_any()))]
    pub async fn fetch_target(&self, cluster_name: &str, canary: &Canary) -> Result<TargetWorkload> {
        let namespace = canary.target_namespace();
        let name = canary.target_name();
        let kind = canary.target_kind();

        debug!("Fetching {} {}/{}", kind, namespace, name);

        let result = match kind {
            targets::DEPLOYMENT => self
                .pool()
                .get::<Deployment>(cluster_name, &namespace, name)
                .await
                .map(TargetWorkload::Deployment),
            targets::DAEMON_SET => self
                .pool()
                .get::<DaemonSet>(cluster_name, &namespace, name)
                .await
                .map(TargetWorkload::DaemonSet),
            _ => {
                return Err(LookoutError::UnsupportedTarget {
                    api_version: canary.spec.target_ref.api_version.clone(),
                    kind: kind.to_string(),
                })
            }
        };

        result.map_err(|e| match e {
            LookoutError::KubeError(kube::Error::Api(err)) if err.code == 404 => {
                LookoutError::WorkloadNotFound {
                    cluster: cluster_name.to_string(),
                    namespace: namespace.clone(),
                    kind: kind.to_string(),
                    name: name.to_string(),
                }
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::{ClusterPool, CrdCache};
    use crate::test_utils::{
        canary_json, daemon_set_json, deployment_json, not_found_json, MockService,
    };
    use std::sync::Arc;
    use std::time::Duration;

    const DEPLOYMENT_PATH: &str = "/apis/apps/v1/namespaces/podinfo/deployments/frontend";

    async fn make_fetcher(clusters: Vec<(&str, MockService)>) -> CanaryFetcher {
        let pool = Arc::new(ClusterPool::new(Duration::from_secs(5)));
        for (name, service) in clusters {
            pool.add_cluster(name, service.into_client()).await;
        }
        let crds = Arc::new(CrdCache::new(pool.clone()));
        CanaryFetcher::new(pool, crds)
    }

    fn canary_targeting(kind: &str) -> Canary {
        let mut canary: Canary = serde_json::from_value(canary_json("frontend", "podinfo")).unwrap();
        canary.spec.target_ref.kind = kind.to_string();
        canary
    }

    #[tokio::test]
    async fn test_fetch_deployment_target() {
        let fetcher = make_fetcher(vec![(
            "a",
            MockService::new().on_get(DEPLOYMENT_PATH, 200, &deployment_json("frontend", "podinfo")),
        )])
        .await;

        let target = fetcher
            .fetch_target("a", &canary_targeting("Deployment"))
            .await
            .unwrap();

        assert_eq!(target.kind(), "Deployment");
        assert_eq!(target.name(), "frontend");
    }

    #[tokio::test]
    async fn test_fetch_daemon_set_target() {
        let fetcher = make_fetcher(vec![(
            "a",
            MockService::new().on_get(
                "/apis/apps/v1/namespaces/podinfo/daemonsets/frontend",
                200,
                &daemon_set_json("frontend", "podinfo"),
            ),
        )])
        .await;

        let target = fetcher
            .fetch_target("a", &canary_targeting("DaemonSet"))
            .await
            .unwrap();

        assert_eq!(target.kind(), "DaemonSet");
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found() {
        let fetcher = make_fetcher(vec![(
            "a",
            MockService::new().on_get(DEPLOYMENT_PATH, 404, &not_found_json("deployments", "frontend")),
        )])
        .await;

        let err = fetcher
            .fetch_target("a", &canary_targeting("Deployment"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(matches!(
            err,
            LookoutError::WorkloadNotFound { ref cluster, ref namespace, ref name, .. }
                if cluster == "a" && namespace == "podinfo" && name == "frontend"
        ));
    }

    #[tokio::test]
    async fn test_target_is_only_looked_up_on_named_cluster() {
        let fetcher = make_fetcher(vec![
            (
                "a",
                MockService::new().on_get(DEPLOYMENT_PATH, 404, &not_found_json("deployments", "frontend")),
            ),
            (
                "b",
                MockService::new().on_get(DEPLOYMENT_PATH, 200, &deployment_json("frontend", "podinfo")),
            ),
        ])
        .await;

        let err = fetcher
            .fetch_target("a", &canary_targeting("Deployment"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_transport_error_is_surfaced() {
        let fetcher = make_fetcher(vec![("a", MockService::unreachable())]).await;

        let err = fetcher
            .fetch_target("a", &canary_targeting("Deployment"))
            .await
            .unwrap_err();

        assert!(matches!(err, LookoutError::KubeError(_)));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_cluster() {
        let fetcher = make_fetcher(vec![]).await;

        let err = fetcher
            .fetch_target("nope", &canary_targeting("Deployment"))
            .await
            .unwrap_err();

        assert!(matches!(err, LookoutError::UnknownCluster(_)));
    }

    #[tokio::test]
    async fn test_unsupported_target_kind() {
        let fetcher = make_fetcher(vec![("a", MockService::new())]).await;

        let err = fetcher
            .fetch_target("a", &canary_targeting("StatefulSet"))
            .await
            .unwrap_err();

        assert!(matches!(err, LookoutError::UnsupportedTarget { kind, .. } if kind == "StatefulSet"));
    }
}

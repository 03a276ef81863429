// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookoutError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Unknown cluster: {0}")]
    UnknownCluster(String),

    #[error("Invalid page token: {0}")]
    InvalidPageToken(String),

    #[error("Request to cluster {cluster} timed out after {after:?}")]
    Timeout { cluster: String, after: Duration },

    #[error("{kind} {namespace}/{name} not found on cluster {cluster}")]
    WorkloadNotFound {
        cluster: String,
        namespace: String,
        kind: String,
        name: String,
    },

    #[error("Unsupported canary target {api_version}/{kind}")]
    UnsupportedTarget { api_version: String, kind: String },
}

impl LookoutError {
    /// True for errors meaning "the requested object does not exist"
    pub fn is_not_found(&self) -> bool {
        match self {
            LookoutError::WorkloadNotFound { .. } => true,
            LookoutError::KubeError(kube::Error::Api(err)) => err.code == 404,
            _ => false,
        }
    }
}

/// What went wrong on a single cluster during a fan-out call
#[derive(Error, Debug)]
pub enum ClusterErrorKind {
    #[error("request failed: {0}")]
    Transport(#[from] kube::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{crd} is not available on this cluster")]
    CapabilityMissing { crd: String },
}

impl ClusterErrorKind {
    pub fn is_capability_missing(&self) -> bool {
        matches!(self, ClusterErrorKind::CapabilityMissing { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClusterErrorKind::Transport(_) | ClusterErrorKind::Timeout(_)
        )
    }
}

#[derive(Error, Debug)]
#[error("cluster {cluster}: {kind}")]
pub struct ClusterError {
    pub cluster: String,
    #[source]
    pub kind: ClusterErrorKind,
}

impl Serialize for ClusterError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let reason = match self.kind {
            ClusterErrorKind::Transport(_) => "Transport",
            ClusterErrorKind::Timeout(_) => "Timeout",
            ClusterErrorKind::CapabilityMissing { .. } => "CapabilityMissing",
        };

        let mut state = serializer.serialize_struct("ClusterError", 3)?;
        state.serialize_field("clusterName", &self.cluster)?;
        state.serialize_field("reason", reason)?;
        state.serialize_field("message", &self.kind.to_string())?;
        state.end()
    }
}

/// Clusters that failed during a clustered call. It travels with the results
/// of the clusters that did succeed instead of replacing them.
#[derive(Error, Debug, Default)]
#[error("{} cluster(s) failed: {}", .errors.len(), summary(.errors))]
pub struct ClusteredListError {
    pub errors: Vec<ClusterError>,
}

impl ClusteredListError {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, cluster: impl Into<String>, kind: ClusterErrorKind) {
        self.errors.push(ClusterError {
            cluster: cluster.into(),
            kind,
        });
    }
}

fn summary(errors: &[ClusterError]) -> String {
    errors
        .iter()
        .map(|e| e.cluster.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, LookoutError>;

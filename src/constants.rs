// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Flagger resource definitions
pub mod flagger {
    /// CRD that must be installed on a cluster for canaries to be listed there
    pub const CANARY_CRD_NAME: &str = "canaries.flagger.app";
}

/// Workload kinds a canary can target
pub mod targets {
    pub const DEPLOYMENT: &str = "Deployment";
    pub const DAEMON_SET: &str = "DaemonSet";
}

/// Defaults used when the environment does not say otherwise
pub mod defaults {
    /// Per-cluster request timeout in seconds
    pub const CLUSTER_TIMEOUT_SECS: u64 = 30;
    /// CRD cache staleness window in seconds, 0 refreshes on every check
    pub const CRD_REFRESH_SECS: u64 = 0;
}

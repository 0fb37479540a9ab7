//! Port onto the running database cluster itself (§6): a read-only version
//! probe plus cluster health / scaling-intent polling used by the scaling
//! integration worker (§4.6).

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::errors::OperatorResult;
use crate::domain::models::ServerGroup;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub server: String,
    pub version: String,
}

/// A single coordinator or dbserver's reported health, keyed by member ID
/// in `ClusterHealth::members`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberHealth {
    Good,
    Bad,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterHealth {
    pub members: BTreeMap<String, MemberHealth>,
}

/// The cluster's own opinion of how many members each group should have,
/// used by the scaling integration worker to reconcile operator-driven
/// scaling with database-driven rebalancing (§4.6, §9 Open Question).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScalingIntent {
    pub desired_counts: BTreeMap<ServerGroup, u32>,
}

#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// `GET /_api/version` against one coordinator/single endpoint, used as
    /// the simplest possible reachability probe.
    async fn version(&self, namespace: &str, name: &str) -> OperatorResult<VersionInfo>;

    async fn cluster_health(&self, namespace: &str, name: &str) -> OperatorResult<ClusterHealth>;

    async fn scaling_intent(&self, namespace: &str, name: &str) -> OperatorResult<ScalingIntent>;
}

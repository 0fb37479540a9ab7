//! Port for reading and writing the custom resource itself: spec and status
//! are separate writes (§6), spec updates are a full PUT/replace, status
//! updates are a best-effort deep-equal skip.

use async_trait::async_trait;

use crate::domain::errors::OperatorResult;
use crate::domain::models::{Deployment, DeploymentSpec, DeploymentStatus};

/// Identifies one custom resource instance without pulling in its full body.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeploymentRef {
    pub namespace: String,
    pub name: String,
}

#[async_trait]
pub trait CustomResourceClient: Send + Sync {
    /// Current state as observed in the API, or `None` if it no longer
    /// exists (the DM treats this as deletion notification, §4.1).
    async fn get(&self, deployment_ref: &DeploymentRef) -> OperatorResult<Option<Deployment>>;

    /// Full replace of `spec`. Must fail with `OperatorError::Conflict` when
    /// `generation` no longer matches the stored resource version, so
    /// callers can retry against a freshly fetched copy (§5, §7).
    async fn update_spec(
        &self,
        deployment_ref: &DeploymentRef,
        generation: u64,
        spec: &DeploymentSpec,
    ) -> OperatorResult<()>;

    /// Replace `status`. Implementations are expected (but not required) to
    /// skip the write entirely when the new status deep-equals the stored
    /// one, since status churn is otherwise unbounded under the inspection
    /// loop (§4.5).
    async fn update_status(
        &self,
        deployment_ref: &DeploymentRef,
        generation: u64,
        status: &DeploymentStatus,
    ) -> OperatorResult<()>;
}

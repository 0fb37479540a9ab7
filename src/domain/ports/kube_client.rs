//! Generic Kubernetes-style object API port (§6): pods, services, PVCs,
//! secrets, events. Out of scope per §1 — the wire-level client is an
//! external collaborator; this crate only depends on the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::OperatorResult;
use crate::domain::models::ServerGroup;

/// A pod specification as the materializer hands it to the cluster. Kept
/// intentionally flat — the fields the reconciler/materializer actually
/// reason about, not a full Kubernetes `PodSpec` mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSpec {
    pub name: String,
    pub namespace: String,
    pub owner_uid: String,
    pub group: ServerGroup,
    pub member_id: String,
    pub image: String,
    pub image_pull_policy: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub mounts: Vec<VolumeMount>,
    pub liveness_probe: Option<HttpProbe>,
    pub readiness_probe: Option<HttpProbe>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpProbe {
    pub path: String,
    pub secure: bool,
    pub authorization: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    ClusterIp,
    Headless,
    LoadBalancer,
    NodePort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    pub namespace: String,
    pub owner_uid: String,
    pub ty: ServiceType,
    pub selector: String,
    pub port: u16,
    pub load_balancer_ip: Option<String>,
    pub node_port: Option<u16>,
}

/// The operator's own observation of a previously-created service: what it
/// asked for, plus what the cluster reports back (ingress IP assignment is
/// the one bit the §4.2 Auto-demotion logic needs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedService {
    pub spec: ServiceSpec,
    pub created_at_unix_ms: i64,
    pub load_balancer_ingress_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvcSpec {
    pub name: String,
    pub namespace: String,
    pub owner_uid: String,
    pub storage_class_name: Option<String>,
    pub storage_request: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSeverity {
    Normal,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorEvent {
    pub severity: EventSeverity,
    pub reason: String,
    pub message: String,
}

/// Generic CRUD surface over pods/services/PVCs/secrets/events, with
/// conflict/not-found/already-exists folded into `OperatorError` (§7) so
/// callers can pattern-match on effect rather than a transport-specific
/// error type.
#[async_trait]
pub trait KubeClient: Send + Sync {
    async fn create_pod(&self, pod: &PodSpec) -> OperatorResult<()>;
    async fn delete_pod(&self, namespace: &str, name: &str) -> OperatorResult<()>;
    async fn get_pod_ready(&self, namespace: &str, name: &str) -> OperatorResult<Option<bool>>;

    async fn create_service(&self, svc: &ServiceSpec) -> OperatorResult<()>;
    async fn get_service(&self, namespace: &str, name: &str) -> OperatorResult<Option<ObservedService>>;
    async fn delete_service(&self, namespace: &str, name: &str) -> OperatorResult<()>;

    async fn create_pvc(&self, pvc: &PvcSpec) -> OperatorResult<()>;
    async fn delete_pvc(&self, namespace: &str, name: &str) -> OperatorResult<()>;

    async fn ensure_secret(&self, secret: &SecretRef) -> OperatorResult<()>;

    async fn create_event(&self, namespace: &str, owner_name: &str, event: &OperatorEvent) -> OperatorResult<()>;
}

//! Ports onto everything outside this crate's core: the generic
//! Kubernetes-style object API, the custom resource itself, and the
//! database cluster. One trait per file, aggregated here, mirroring the
//! teacher's `domain::ports` layout.

pub mod custom_resource_client;
pub mod database_client;
pub mod kube_client;

pub use custom_resource_client::{CustomResourceClient, DeploymentRef};
pub use database_client::{ClusterHealth, DatabaseClient, MemberHealth, ScalingIntent, VersionInfo};
pub use kube_client::{
    EventSeverity, HttpProbe, KubeClient, ObservedService, OperatorEvent, PodSpec, PvcSpec,
    SecretRef, ServiceSpec, ServiceType, VolumeMount,
};

//! Plain data shapes shared by every layer: the Deployment/spec/status types,
//! member status, and operator configuration.

pub mod config;
pub mod deployment;
pub mod member;

pub use config::{Config, LogConfig, LogFormat};
pub use deployment::{
    AuthenticationSpec, Deployment, DeploymentPhase, DeploymentSpec, DeploymentStatus,
    Environment, ExternalAccessSpec, ExternalAccessType, ImageInfo, ImageMap, Mode,
    ResourceList, ResourceRequirements, RocksDbEncryptionSpec, RocksDbSpec, ServerGroup,
    ServerGroupSpec, StorageEngine, SyncMonitoringSpec, SyncSpec, TlsSpec,
};
pub use member::{MemberCondition, MemberConditions, MemberList, MemberPhase, MemberStatus, MemberStatusList};

//! Deployment spec and status types.
//!
//! Mirrors the custom resource shape: a declared `DeploymentSpec`, and the
//! `DeploymentStatus` the operator maintains alongside it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::member::MemberStatusList;

/// Deployment mode, fixed at creation (not part of the immutable-field
/// machinery because changing it has no defined reconciliation path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Single,
    ActiveFailover,
    Cluster,
}

impl Mode {
    pub fn has_single_servers(self) -> bool {
        matches!(self, Mode::Single | Mode::ActiveFailover)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

/// Storage engine selection; `AsArangoArgument` in the original maps this to
/// the wire string arangod expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageEngine {
    RocksDB,
    MMFiles,
}

impl Default for StorageEngine {
    fn default() -> Self {
        StorageEngine::RocksDB
    }
}

impl StorageEngine {
    pub fn as_arango_argument(self) -> &'static str {
        match self {
            StorageEngine::RocksDB => "rocksdb",
            StorageEngine::MMFiles => "mmfiles",
        }
    }
}

/// One role a database member may play. `DBServers`/`Coordinators` only
/// exist in `Cluster` mode; `SyncMasters`/`SyncWorkers` only when sync is
/// enabled; `Single` is used by both `Single` and `ActiveFailover` modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerGroup {
    Single,
    Agents,
    DBServers,
    Coordinators,
    SyncMasters,
    SyncWorkers,
}

impl ServerGroup {
    pub const ALL: [ServerGroup; 6] = [
        ServerGroup::Single,
        ServerGroup::Agents,
        ServerGroup::DBServers,
        ServerGroup::Coordinators,
        ServerGroup::SyncMasters,
        ServerGroup::SyncWorkers,
    ];

    pub fn as_role(self) -> &'static str {
        match self {
            ServerGroup::Single => "single",
            ServerGroup::Agents => "agent",
            ServerGroup::DBServers => "dbserver",
            ServerGroup::Coordinators => "coordinator",
            ServerGroup::SyncMasters => "syncmaster",
            ServerGroup::SyncWorkers => "syncworker",
        }
    }

    pub fn as_role_abbreviated(self) -> &'static str {
        match self {
            ServerGroup::Single => "sngl",
            ServerGroup::Agents => "agnt",
            ServerGroup::DBServers => "prmr",
            ServerGroup::Coordinators => "crdn",
            ServerGroup::SyncMasters => "sync",
            ServerGroup::SyncWorkers => "syws",
        }
    }

    pub fn is_arangod(self) -> bool {
        !matches!(self, ServerGroup::SyncMasters | ServerGroup::SyncWorkers)
    }

    pub fn is_arangosync(self) -> bool {
        matches!(self, ServerGroup::SyncMasters | ServerGroup::SyncWorkers)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceList(pub BTreeMap<String, String>);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub requests: ResourceList,
    #[serde(default)]
    pub limits: ResourceList,
}

/// Per-role shape. See §3/§4.4 for defaulting, validation, and the
/// immutable-field subset (count and storageClassName for Agents;
/// storageClassName for every other group).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerGroupSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
    #[serde(default)]
    pub resources: ResourceRequirements,
}

impl ServerGroupSpec {
    pub fn count(&self) -> u32 {
        self.count.unwrap_or(0)
    }

    /// Fills unspecified fields from an earlier source spec (used when
    /// merging a spec update on top of the previously accepted spec).
    pub fn set_defaults_from(&mut self, source: &ServerGroupSpec) {
        if self.count.is_none() {
            self.count = source.count;
        }
        if self.args.is_empty() {
            self.args = source.args.clone();
        }
        if self.storage_class_name.is_none() {
            self.storage_class_name = source.storage_class_name.clone();
        }
        for (k, v) in &source.resources.requests.0 {
            self.resources
                .requests
                .0
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        for (k, v) in &source.resources.limits.0 {
            self.resources
                .limits
                .0
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsSpec {
    /// Secret holding the CA. `"None"` disables TLS.
    pub ca_secret_name: String,
}

impl Default for TlsSpec {
    fn default() -> Self {
        Self {
            ca_secret_name: "None".to_string(),
        }
    }
}

impl TlsSpec {
    pub fn is_secure(&self) -> bool {
        self.ca_secret_name != "None"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret_name: Option<String>,
}

impl AuthenticationSpec {
    pub fn is_authenticated(&self) -> bool {
        self.jwt_secret_name.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RocksDbEncryptionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_secret_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RocksDbSpec {
    #[serde(default)]
    pub encryption: RocksDbEncryptionSpec,
}

impl RocksDbSpec {
    pub fn is_encrypted(&self) -> bool {
        self.encryption.key_secret_name.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMonitoringSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub monitoring: SyncMonitoringSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl SyncSpec {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalAccessType {
    None,
    Auto,
    LoadBalancer,
    NodePort,
}

impl Default for ExternalAccessType {
    fn default() -> Self {
        ExternalAccessType::Auto
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAccessSpec {
    #[serde(rename = "type", default)]
    pub ty: ExternalAccessType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_port: Option<u16>,
}

/// The full declared shape of a Deployment. This is what gets hashed (in
/// canonical form) to produce the pod suffix, and what `Validate`,
/// `Defaults`, and `ResetImmutableFields` operate on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub mode: Mode,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub storage_engine: StorageEngine,
    pub image: String,
    #[serde(default = "default_image_pull_policy")]
    pub image_pull_policy: String,
    #[serde(default)]
    pub tls: TlsSpec,
    #[serde(default)]
    pub authentication: AuthenticationSpec,
    #[serde(default)]
    pub rocks_db: RocksDbSpec,
    #[serde(default)]
    pub sync: SyncSpec,
    #[serde(default)]
    pub external_access: ExternalAccessSpec,

    #[serde(default)]
    pub single: ServerGroupSpec,
    #[serde(default)]
    pub agents: ServerGroupSpec,
    #[serde(default)]
    pub db_servers: ServerGroupSpec,
    #[serde(default)]
    pub coordinators: ServerGroupSpec,
    #[serde(default)]
    pub sync_masters: ServerGroupSpec,
    #[serde(default)]
    pub sync_workers: ServerGroupSpec,
}

fn default_image_pull_policy() -> String {
    "IfNotPresent".to_string()
}

impl DeploymentSpec {
    pub fn is_secure(&self) -> bool {
        self.tls.is_secure()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authentication.is_authenticated()
    }

    pub fn is_development(&self) -> bool {
        matches!(self.environment, Environment::Development)
    }

    pub fn get_server_group_spec(&self, group: ServerGroup) -> &ServerGroupSpec {
        match group {
            ServerGroup::Single => &self.single,
            ServerGroup::Agents => &self.agents,
            ServerGroup::DBServers => &self.db_servers,
            ServerGroup::Coordinators => &self.coordinators,
            ServerGroup::SyncMasters => &self.sync_masters,
            ServerGroup::SyncWorkers => &self.sync_workers,
        }
    }

    pub fn get_server_group_spec_mut(&mut self, group: ServerGroup) -> &mut ServerGroupSpec {
        match group {
            ServerGroup::Single => &mut self.single,
            ServerGroup::Agents => &mut self.agents,
            ServerGroup::DBServers => &mut self.db_servers,
            ServerGroup::Coordinators => &mut self.coordinators,
            ServerGroup::SyncMasters => &mut self.sync_masters,
            ServerGroup::SyncWorkers => &mut self.sync_workers,
        }
    }

    /// Whether `group` is expected to have any members under this spec's
    /// mode/sync configuration. Drives the used/unused branch of §3/§4.4.
    pub fn group_is_used(&self, group: ServerGroup) -> bool {
        match group {
            ServerGroup::Single => matches!(self.mode, Mode::Single | Mode::ActiveFailover),
            ServerGroup::Agents => matches!(self.mode, Mode::Cluster | Mode::ActiveFailover),
            ServerGroup::DBServers | ServerGroup::Coordinators => {
                matches!(self.mode, Mode::Cluster)
            }
            ServerGroup::SyncMasters | ServerGroup::SyncWorkers => self.sync.is_enabled(),
        }
    }
}

/// Phase of the Deployment as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentPhase {
    None,
    Running,
    Failed,
}

impl Default for DeploymentPhase {
    fn default() -> Self {
        DeploymentPhase::None
    }
}

/// Observed image -> image ID mapping, populated by a collaborator outside
/// this crate's core (image ID resolution is infrastructure, not core).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub image_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMap(pub BTreeMap<String, ImageInfo>);

impl ImageMap {
    pub fn get_by_image(&self, image: &str) -> Option<&ImageInfo> {
        self.0.get(image)
    }
}

/// The operator-maintained status alongside the declared spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    #[serde(default)]
    pub phase: DeploymentPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_spec: Option<DeploymentSpec>,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub sync_service_name: String,
    #[serde(default)]
    pub images: ImageMap,
    #[serde(default)]
    pub members: MemberStatusList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Identity + spec + status of one custom resource instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub namespace: String,
    pub name: String,
    pub uid: String,
    pub generation: u64,
    pub spec: DeploymentSpec,
    #[serde(default)]
    pub status: DeploymentStatus,
}

impl Deployment {
    pub fn headless_service_name(&self) -> String {
        format!("{}-int", self.name)
    }
}

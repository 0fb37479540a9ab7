//! Arangod command-line argument synthesizer (§4.3), grounded exactly on
//! `createArangodArgs`: a fixed set of always-emitted options, role-specific
//! options, sorted lexicographically by key then value, followed by the
//! user's own extra args in their original order.

use crate::domain::models::{DeploymentSpec, MemberList, Mode, ServerGroup};

pub const ARANGO_PORT: u16 = 8529;

const JWT_SECRET_ENV_VAR: &str = "ARANGOD_JWT_SECRET";
const TLS_KEYFILE_MOUNT_DIR: &str = "/secrets/tls";
const TLS_KEYFILE_NAME: &str = "tls.keyfile";
const ENCRYPTION_KEYFILE_MOUNT_DIR: &str = "/secrets/rocksdb";
const ENCRYPTION_KEYFILE_NAME: &str = "encryption.key";
const DATA_MOUNT_DIR: &str = "/data";

/// One `--key value` option pair, ordered by key then value to match the
/// sort the original performs before joining into `key=value` strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct OptionPair {
    key: String,
    value: String,
}

impl OptionPair {
    fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

fn scheme(secure: bool) -> &'static str {
    if secure {
        "ssl"
    } else {
        "tcp"
    }
}

fn member_tcp_url(deployment_name: &str, headless_service_name: &str, namespace: &str, role: &str, id: &str, secure: bool) -> String {
    format!(
        "{}://{}-{}-{}.{}.{}.svc:{}",
        scheme(secure),
        deployment_name,
        role,
        id,
        headless_service_name,
        namespace,
        ARANGO_PORT
    )
}

/// Produces the full, sorted, stable argument list for one member.
///
/// `agents` is the full member list for the Agents group (used both when
/// synthesizing the Agents role's own args, and to append agency endpoints
/// for every other role that needs to reach the agency).
#[allow(clippy::too_many_arguments)]
pub fn create_arangod_args(
    deployment_name: &str,
    headless_service_name: &str,
    namespace: &str,
    spec: &DeploymentSpec,
    group: ServerGroup,
    agents: &MemberList,
    id: &str,
    auto_upgrade: bool,
) -> Vec<String> {
    let svr_spec = spec.get_server_group_spec(group);
    let secure = spec.is_secure();
    let mut options = Vec::with_capacity(32);

    options.push(OptionPair::new(
        "--server.endpoint",
        format!("{}://[::]:{ARANGO_PORT}", scheme(secure)),
    ));

    if spec.is_authenticated() {
        options.push(OptionPair::new("--server.authentication", "true"));
        options.push(OptionPair::new(
            "--server.jwt-secret",
            format!("$({JWT_SECRET_ENV_VAR})"),
        ));
    } else {
        options.push(OptionPair::new("--server.authentication", "false"));
    }

    options.push(OptionPair::new(
        "--server.storage-engine",
        spec.storage_engine.as_arango_argument(),
    ));
    options.push(OptionPair::new("--log.level", "INFO"));

    if secure {
        options.push(OptionPair::new(
            "--ssl.keyfile",
            format!("{TLS_KEYFILE_MOUNT_DIR}/{TLS_KEYFILE_NAME}"),
        ));
        options.push(OptionPair::new("--ssl.ecdh-curve", ""));
    }

    if spec.rocks_db.is_encrypted() {
        options.push(OptionPair::new(
            "--rocksdb.encryption-keyfile",
            format!("{ENCRYPTION_KEYFILE_MOUNT_DIR}/{ENCRYPTION_KEYFILE_NAME}"),
        ));
    }

    options.push(OptionPair::new("--database.directory", DATA_MOUNT_DIR));
    options.push(OptionPair::new("--log.output", "+"));

    if auto_upgrade {
        options.push(OptionPair::new("--database.auto-upgrade", "true"));
    }

    let my_url = member_tcp_url(deployment_name, headless_service_name, namespace, group.as_role(), id, secure);
    let mut add_agent_endpoints = false;

    match group {
        ServerGroup::Agents => {
            options.push(OptionPair::new("--agency.disaster-recovery-id", id));
            options.push(OptionPair::new("--agency.activate", "true"));
            options.push(OptionPair::new("--agency.my-address", my_url.clone()));
            options.push(OptionPair::new("--agency.size", spec.agents.count().to_string()));
            options.push(OptionPair::new("--agency.supervision", "true"));
            options.push(OptionPair::new("--foxx.queues", "false"));
            options.push(OptionPair::new("--server.statistics", "false"));
            for peer in &agents.0 {
                if peer.id != id {
                    let endpoint = member_tcp_url(
                        deployment_name,
                        headless_service_name,
                        namespace,
                        ServerGroup::Agents.as_role(),
                        &peer.id,
                        secure,
                    );
                    options.push(OptionPair::new("--agency.endpoint", endpoint));
                }
            }
        }
        ServerGroup::DBServers => {
            add_agent_endpoints = true;
            options.push(OptionPair::new("--cluster.my-address", my_url.clone()));
            options.push(OptionPair::new("--cluster.my-role", "PRIMARY"));
            options.push(OptionPair::new("--foxx.queues", "false"));
            options.push(OptionPair::new("--server.statistics", "true"));
        }
        ServerGroup::Coordinators => {
            add_agent_endpoints = true;
            options.push(OptionPair::new("--cluster.my-address", my_url.clone()));
            options.push(OptionPair::new("--cluster.my-role", "COORDINATOR"));
            options.push(OptionPair::new("--foxx.queues", "true"));
            options.push(OptionPair::new("--server.statistics", "true"));
        }
        ServerGroup::Single => {
            options.push(OptionPair::new("--foxx.queues", "true"));
            options.push(OptionPair::new("--server.statistics", "true"));
            if spec.mode == Mode::ActiveFailover {
                add_agent_endpoints = true;
                options.push(OptionPair::new("--replication.automatic-failover", "true"));
                options.push(OptionPair::new("--cluster.my-address", my_url.clone()));
                options.push(OptionPair::new("--cluster.my-role", "SINGLE"));
            }
        }
        ServerGroup::SyncMasters | ServerGroup::SyncWorkers => {
            // arangosync argument synthesis is a distinct, not-yet-specified
            // concern (§4.3 only covers arangod).
        }
    }

    if add_agent_endpoints {
        for peer in &agents.0 {
            let endpoint = member_tcp_url(
                deployment_name,
                headless_service_name,
                namespace,
                ServerGroup::Agents.as_role(),
                &peer.id,
                secure,
            );
            options.push(OptionPair::new("--cluster.agency-endpoint", endpoint));
        }
    }

    options.sort();

    let mut args = Vec::with_capacity(options.len() + svr_spec.args.len());
    args.extend(options.into_iter().map(|o| format!("{}={}", o.key, o.value)));
    args.extend(svr_spec.args.iter().cloned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Environment, MemberStatus, StorageEngine};

    fn base_spec(mode: Mode) -> DeploymentSpec {
        DeploymentSpec {
            mode,
            environment: Environment::Production,
            storage_engine: StorageEngine::RocksDB,
            image: "arangodb/arangodb:3.11".to_string(),
            image_pull_policy: "IfNotPresent".to_string(),
            tls: Default::default(),
            authentication: Default::default(),
            rocks_db: Default::default(),
            sync: Default::default(),
            external_access: Default::default(),
            single: Default::default(),
            agents: Default::default(),
            db_servers: Default::default(),
            coordinators: Default::default(),
            sync_masters: Default::default(),
            sync_workers: Default::default(),
        }
    }

    #[test]
    fn args_are_sorted_and_stable() {
        let spec = base_spec(Mode::Cluster);
        let agents = MemberList(vec![MemberStatus::new("a1".into()), MemberStatus::new("a2".into())]);
        let a = create_arangod_args("my-depl", "my-depl-int", "default", &spec, ServerGroup::DBServers, &agents, "db1", false);
        let b = create_arangod_args("my-depl", "my-depl-int", "default", &spec, ServerGroup::DBServers, &agents, "db1", false);
        assert_eq!(a, b);

        let keys: Vec<&str> = a
            .iter()
            .filter_map(|arg| arg.split('=').next())
            .collect();
        let mut sorted_keys = keys.clone();
        sorted_keys.sort();
        assert_eq!(keys, sorted_keys);
    }

    #[test]
    fn dbserver_gets_one_agency_endpoint_per_agent() {
        let spec = base_spec(Mode::Cluster);
        let agents = MemberList(vec![MemberStatus::new("a1".into()), MemberStatus::new("a2".into())]);
        let args = create_arangod_args("my-depl", "my-depl-int", "default", &spec, ServerGroup::DBServers, &agents, "db1", false);
        let agency_endpoints = args.iter().filter(|a| a.starts_with("--cluster.agency-endpoint=")).count();
        assert_eq!(agency_endpoints, 2);
        assert!(args.iter().any(|a| a == "--cluster.my-role=PRIMARY"));
    }

    #[test]
    fn agent_excludes_its_own_endpoint() {
        let spec = base_spec(Mode::Cluster);
        let agents = MemberList(vec![MemberStatus::new("a1".into()), MemberStatus::new("a2".into())]);
        let args = create_arangod_args("my-depl", "my-depl-int", "default", &spec, ServerGroup::Agents, &agents, "a1", false);
        let endpoints: Vec<&String> = args.iter().filter(|a| a.starts_with("--agency.endpoint=")).collect();
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints[0].contains("a2"));
    }

    #[test]
    fn secure_deployment_adds_tls_and_auth_args() {
        let mut spec = base_spec(Mode::Single);
        spec.tls.ca_secret_name = "my-ca".to_string();
        spec.authentication.jwt_secret_name = Some("my-jwt".to_string());
        let agents = MemberList::default();
        let args = create_arangod_args("my-depl", "my-depl-int", "default", &spec, ServerGroup::Single, &agents, "s1", false);
        assert!(args.iter().any(|a| a == "--server.authentication=true"));
        assert!(args.iter().any(|a| a.starts_with("--server.endpoint=ssl://")));
        assert!(args.iter().any(|a| a.starts_with("--ssl.keyfile=")));
    }

    #[test]
    fn user_args_appended_in_original_order() {
        let mut spec = base_spec(Mode::Single);
        spec.single.args = vec!["--foo.bar".to_string(), "--baz.qux".to_string()];
        let agents = MemberList::default();
        let args = create_arangod_args("my-depl", "my-depl-int", "default", &spec, ServerGroup::Single, &agents, "s1", false);
        assert_eq!(&args[args.len() - 2..], &["--foo.bar".to_string(), "--baz.qux".to_string()]);
    }
}

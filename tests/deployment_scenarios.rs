//! End-to-end scenarios driven entirely through the public `Controller`/
//! `DeploymentManager` surface against the in-memory adapters, rather than
//! unit-testing individual pure functions in isolation.

use std::sync::Arc;
use std::time::Duration;

use arangodb_operator::adapters::memory::{MemoryCustomResourceClient, MemoryDatabaseClient, MemoryKubeClient};
use arangodb_operator::domain::models::{
    Deployment, DeploymentSpec, DeploymentStatus, Mode, ServerGroup,
};
use arangodb_operator::domain::ports::ScalingIntent;
use arangodb_operator::services::{validation, DeploymentManager, DeploymentManagerConfig};

fn fast_config() -> DeploymentManagerConfig {
    DeploymentManagerConfig {
        min_inspection_interval: Duration::from_millis(20),
        max_inspection_interval: Duration::from_millis(200),
        ..Default::default()
    }
}

fn minimal_deployment(mode: Mode) -> Deployment {
    let mut spec = DeploymentSpec {
        mode,
        environment: Default::default(),
        storage_engine: Default::default(),
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
    };
    validation::set_defaults(&mut spec);

    Deployment {
        namespace: "default".to_string(),
        name: "my-cluster".to_string(),
        uid: "uid-1".to_string(),
        generation: 1,
        spec,
        status: DeploymentStatus::default(),
    }
}

async fn spawn_cluster() -> (Arc<DeploymentManager>, Arc<MemoryKubeClient>, Arc<MemoryCustomResourceClient>) {
    let kube = Arc::new(MemoryKubeClient::new());
    let cr = Arc::new(MemoryCustomResourceClient::new());
    let deployment = minimal_deployment(Mode::Cluster);
    cr.insert(deployment.clone());

    let dm = DeploymentManager::spawn(deployment, kube.clone(), cr.clone(), None, fast_config()).unwrap();
    (dm, kube, cr)
}

/// S1: a fresh cluster deployment bootstraps to its default member counts,
/// a scale-up spec update grows the relevant groups, and a scale-down spec
/// update shrinks them back, tearing down the surplus pods along the way.
#[tokio::test]
async fn s1_cluster_scales_up_and_down() {
    let (dm, kube, cr) = spawn_cluster().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let initial = dm.current();
    let counts = initial.status.members.counts();
    assert_eq!(counts[&ServerGroup::Agents], 3);
    assert_eq!(counts[&ServerGroup::DBServers], 3);
    assert_eq!(counts[&ServerGroup::Coordinators], 3);
    let initial_pod_count = kube.pod_count();
    assert_eq!(initial_pod_count, 3 + 3 + 3);

    // Scale up DBServers and Coordinators.
    let mut scaled_up = cr.get_snapshot("default", "my-cluster").unwrap();
    scaled_up.spec.db_servers.count = Some(5);
    scaled_up.spec.coordinators.count = Some(4);
    cr.insert(scaled_up);
    dm.notify_spec_updated().await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    let after_scale_up = dm.current();
    let counts = after_scale_up.status.members.counts();
    assert_eq!(counts[&ServerGroup::DBServers], 5);
    assert_eq!(counts[&ServerGroup::Coordinators], 4);
    assert_eq!(kube.pod_count(), 3 + 5 + 4);

    // Scale back down.
    let mut scaled_down = cr.get_snapshot("default", "my-cluster").unwrap();
    scaled_down.spec.db_servers.count = Some(3);
    scaled_down.spec.coordinators.count = Some(2);
    cr.insert(scaled_down);
    dm.notify_spec_updated().await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    let after_scale_down = dm.current();
    let counts = after_scale_down.status.members.counts();
    assert_eq!(counts[&ServerGroup::DBServers], 3);
    assert_eq!(counts[&ServerGroup::Coordinators], 2);
    assert_eq!(kube.pod_count(), 3 + 3 + 2);
}

/// Scaling integration: a database-side scaling intent that disagrees with
/// the accepted spec is folded into the spec, persisted to the CR (not
/// just held in memory), and drives the same reconciliation path as an
/// operator-side spec update.
#[tokio::test]
async fn scaling_intent_is_persisted_to_the_cr() {
    let kube = Arc::new(MemoryKubeClient::new());
    let cr = Arc::new(MemoryCustomResourceClient::new());
    let db = Arc::new(MemoryDatabaseClient::new());
    let deployment = minimal_deployment(Mode::Cluster);
    cr.insert(deployment.clone());

    let dm = DeploymentManager::spawn(deployment, kube.clone(), cr.clone(), Some(db.clone()), fast_config()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(kube.pod_count(), 3 + 3 + 3);

    let mut desired_counts = std::collections::BTreeMap::new();
    desired_counts.insert(ServerGroup::DBServers, 5);
    db.set_scaling_intent("default", "my-cluster", ScalingIntent { desired_counts });

    tokio::time::sleep(Duration::from_millis(250)).await;

    let current = dm.current();
    assert_eq!(current.spec.db_servers.count, Some(5), "scaling proposal must land in the in-memory spec");
    assert_eq!(kube.pod_count(), 3 + 5 + 3, "scaled-up member must get a pod");

    let persisted = cr.get_snapshot("default", "my-cluster").unwrap();
    assert_eq!(
        persisted.spec.db_servers.count,
        Some(5),
        "scaling proposal must be persisted to the CR, not just applied in memory"
    );
}

/// S2: a `Single` deployment with `single.count = 2` is rejected at
/// bootstrap time rather than being allowed to enter `Bootstrapping`.
#[tokio::test]
async fn s2_single_mode_rejects_count_two() {
    let kube = Arc::new(MemoryKubeClient::new());
    let cr = Arc::new(MemoryCustomResourceClient::new());

    let mut deployment = minimal_deployment(Mode::Single);
    deployment.spec.single.count = Some(2);

    let result = DeploymentManager::spawn(deployment, kube, cr, None, fast_config());
    let err = result.expect_err("count=2 must be rejected for Single mode");
    assert!(
        err.to_string().to_lowercase().contains("invalid count value 2"),
        "unexpected error message: {err}"
    );
}

/// S3: Agents.count is immutable once accepted. An update that changes it
/// is rolled back without touching the running agent pods.
#[tokio::test]
async fn s3_agent_count_is_immutable_and_pods_are_undisturbed() {
    let (dm, kube, cr) = spawn_cluster().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let agent_pod_names_before: Vec<String> = dm
        .current()
        .status
        .members
        .group(ServerGroup::Agents)
        .0
        .iter()
        .map(|m| m.pod_name.clone())
        .collect();
    let pod_count_before = kube.pod_count();

    let mut updated = cr.get_snapshot("default", "my-cluster").unwrap();
    updated.spec.agents.count = Some(5);
    cr.insert(updated);
    dm.notify_spec_updated().await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    let current = dm.current();
    assert_eq!(current.spec.agents.count, Some(3), "agent count must be rolled back");
    assert_eq!(kube.pod_count(), pod_count_before, "no pod churn expected for a rejected immutable-field change");

    let agent_pod_names_after: Vec<String> = current
        .status
        .members
        .group(ServerGroup::Agents)
        .0
        .iter()
        .map(|m| m.pod_name.clone())
        .collect();
    assert_eq!(agent_pod_names_before, agent_pod_names_after);
}

/// S5: a secure, authenticated, RocksDB-encrypted cluster produces a
/// DBServer argument set with one `--cluster.agency-endpoint=` per agent
/// and `--cluster.my-role=PRIMARY` exactly once, plus the TLS/auth flags.
#[tokio::test]
async fn s5_secure_cluster_dbserver_args() {
    let mut spec = DeploymentSpec {
        mode: Mode::Cluster,
        environment: Default::default(),
        storage_engine: Default::default(),
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
    };
    validation::set_defaults(&mut spec);
    spec.tls.ca_secret_name = "my-ca".to_string();
    spec.authentication.jwt_secret_name = Some("my-jwt".to_string());
    spec.rocks_db.encryption.key_secret_name = Some("my-rocksdb-key".to_string());

    use arangodb_operator::domain::models::{MemberList, MemberStatus};
    use arangodb_operator::services::args::create_arangod_args;

    let agents = MemberList(vec![
        MemberStatus::new("a1".into()),
        MemberStatus::new("a2".into()),
        MemberStatus::new("a3".into()),
    ]);
    let args = create_arangod_args(
        "my-cluster",
        "my-cluster-int",
        "default",
        &spec,
        ServerGroup::DBServers,
        &agents,
        "db1",
        false,
    );

    let agency_endpoints = args.iter().filter(|a| a.starts_with("--cluster.agency-endpoint=")).count();
    assert_eq!(agency_endpoints, 3, "one agency endpoint per agent");
    let my_role_count = args.iter().filter(|a| a == &"--cluster.my-role=PRIMARY").count();
    assert_eq!(my_role_count, 1);
    assert!(args.iter().any(|a| a == "--server.authentication=true"));
    assert!(args.iter().any(|a| a.starts_with("--server.endpoint=ssl://")));
    assert!(args.iter().any(|a| a.starts_with("--ssl.keyfile=")));
}


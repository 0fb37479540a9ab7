//! Chaos monkey (§2): optional fault injector for test environments, gated
//! by `Config::allow_chaos`. Periodically deletes a random member's pod so
//! the resilience/reconciler path gets exercised under non-deterministic
//! failure, the way a real cluster's hardware eventually would.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::info;

use crate::domain::models::{MemberStatusList, ServerGroup};
use crate::domain::ports::KubeClient;

#[derive(Debug, Clone, Copy)]
pub struct ChaosConfig {
    pub interval: Duration,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10 * 60),
        }
    }
}

/// Picks one member at random across all groups and deletes its pod.
/// Best-effort: errors are logged and swallowed, since a missing pod (the
/// reconciler already replaced it) is an unremarkable outcome here.
pub async fn strike_once(kube: &dyn KubeClient, namespace: &str, members: &MemberStatusList) {
    let mut candidates: Vec<(ServerGroup, &str)> = Vec::new();
    for group in ServerGroup::ALL {
        for member in &members.group(group).0 {
            if !member.pod_name.is_empty() {
                candidates.push((group, member.pod_name.as_str()));
            }
        }
    }
    if candidates.is_empty() {
        return;
    }
    let index = rand::thread_rng().gen_range(0..candidates.len());
    let (group, pod_name) = candidates[index];
    info!(pod = %pod_name, group = ?group, "chaos monkey deleting pod");
    if let Err(err) = kube.delete_pod(namespace, pod_name).await {
        tracing::warn!(pod = %pod_name, error = %err, "chaos monkey failed to delete pod");
    }
}

/// Runs the strike loop until `stop` resolves. Intended to be spawned as
/// its own task alongside the deployment manager's run loop, only when
/// `Config::allow_chaos` is set.
pub async fn run(
    kube: &dyn KubeClient,
    namespace: &str,
    members_source: impl Fn() -> MemberStatusList,
    config: ChaosConfig,
    mut stop: tokio::sync::watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = stop.changed() => {
                if *stop.borrow() {
                    return;
                }
            }
            _ = sleep(config.interval) => {
                let members = members_source();
                strike_once(kube, namespace, &members).await;
            }
        }
    }
}

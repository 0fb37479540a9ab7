//! Top-level `Controller` (§4.7): a thin registry over
//! `(Namespace, Name) -> Arc<DeploymentManager>`, driven by the generic
//! watch/list machinery that sits outside this crate (§1, §6). Mirrors the
//! teacher's `SwarmOrchestrator`/registry split — the controller only owns
//! the map and dispatches `add`/`update`/`delete`; the DM is the unit of
//! concurrency and ownership.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::models::{Config, Deployment, Mode};
use crate::domain::ports::{CustomResourceClient, DatabaseClient, KubeClient};
use crate::services::chaos::{self, ChaosConfig};
use crate::services::deployment_manager::{DeploymentManager, DeploymentManagerConfig};

type DeploymentKey = (String, String);

pub struct Controller {
    config: Config,
    kube: Arc<dyn KubeClient>,
    cr: Arc<dyn CustomResourceClient>,
    db: Option<Arc<dyn DatabaseClient>>,
    deployments: Mutex<HashMap<DeploymentKey, Arc<DeploymentManager>>>,
}

impl Controller {
    pub fn new(
        config: Config,
        kube: Arc<dyn KubeClient>,
        cr: Arc<dyn CustomResourceClient>,
        db: Option<Arc<dyn DatabaseClient>>,
    ) -> Self {
        Self {
            config,
            kube,
            cr,
            db,
            deployments: Mutex::new(HashMap::new()),
        }
    }

    fn dm_config(&self) -> DeploymentManagerConfig {
        DeploymentManagerConfig {
            min_inspection_interval: Duration::from_millis(self.config.min_inspection_interval_ms),
            max_inspection_interval: Duration::from_millis(self.config.max_inspection_interval_ms),
            event_channel_capacity: self.config.event_channel_capacity,
            image_pull_policy: "IfNotPresent".to_string(),
            jwt_authorization: String::new(),
            monitoring_authorization: String::new(),
        }
    }

    /// Handles an *add* notification: first observation of a custom
    /// resource. A Deployment that fails initial validation is rejected
    /// rather than entering Bootstrapping — it is logged, never registered.
    pub async fn on_add(&self, deployment: Deployment) {
        let key = (deployment.namespace.clone(), deployment.name.clone());
        {
            let deployments = self.deployments.lock().await;
            if deployments.contains_key(&key) {
                return;
            }
        }

        let span = tracing::info_span!("deployment", namespace = %deployment.namespace, name = %deployment.name);
        let _enter = span.enter();

        let db = if deployment.spec.mode == Mode::Cluster { self.db.clone() } else { None };

        match DeploymentManager::spawn(deployment, self.kube.clone(), self.cr.clone(), db, self.dm_config()) {
            Ok(dm) => {
                if self.config.allow_chaos {
                    self.spawn_chaos(&dm);
                }
                info!("deployment manager started");
                self.deployments.lock().await.insert(key, dm);
            }
            Err(err) => {
                error!(error = %err, "rejected deployment: initial validation failed");
            }
        }
    }

    fn spawn_chaos(&self, dm: &Arc<DeploymentManager>) {
        let kube = self.kube.clone();
        let namespace = dm.deployment_ref().namespace.clone();
        let stop_rx = dm.subscribe_stop();
        let dm = dm.clone();
        tokio::spawn(async move {
            chaos::run(kube.as_ref(), &namespace, || dm.members_snapshot(), ChaosConfig::default(), stop_rx).await;
        });
    }

    /// Handles an *update* notification by enqueueing a spec-updated event
    /// onto the existing DM. Silently ignored (with a log) if the
    /// deployment is not registered; `DeploymentManager::notify_spec_updated`
    /// itself drops the event if the DM has already stopped.
    pub async fn on_update(&self, namespace: &str, name: &str) {
        let dm = self
            .deployments
            .lock()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned();

        match dm {
            Some(dm) => dm.notify_spec_updated().await,
            None => warn!(namespace, name, "update notification for unregistered deployment"),
        }
    }

    /// Handles a *delete* notification: removes the DM from the registry and
    /// stops its worker, waiting for the run loop's join handle to complete
    /// before returning (§4.7). Idempotent — deleting an unknown deployment
    /// is a no-op.
    pub async fn on_delete(&self, namespace: &str, name: &str) {
        let dm = self.deployments.lock().await.remove(&(namespace.to_string(), name.to_string()));
        if let Some(dm) = dm {
            dm.stop_and_join().await;
            info!(namespace, name, "deployment manager stopped");
        }
    }

    pub async fn deployment_count(&self) -> usize {
        self.deployments.lock().await.len()
    }

    pub async fn get(&self, namespace: &str, name: &str) -> Option<Arc<DeploymentManager>> {
        self.deployments.lock().await.get(&(namespace.to_string(), name.to_string())).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryCustomResourceClient, MemoryDatabaseClient, MemoryKubeClient};
    use crate::domain::models::{DeploymentSpec, DeploymentStatus};
    use crate::services::validation;

    fn deployment_with_mode(mode: Mode) -> Deployment {
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
            name: "my-depl".to_string(),
            uid: "uid-1".to_string(),
            generation: 1,
            spec,
            status: DeploymentStatus::default(),
        }
    }

    fn controller() -> Controller {
        let kube = Arc::new(MemoryKubeClient::new());
        let cr = Arc::new(MemoryCustomResourceClient::new());
        let db = Arc::new(MemoryDatabaseClient::new());
        Controller::new(Config::default(), kube, cr, Some(db))
    }

    #[tokio::test]
    async fn add_registers_a_valid_deployment() {
        let controller = controller();
        controller.on_add(deployment_with_mode(Mode::Single)).await;
        assert_eq!(controller.deployment_count().await, 1);
    }

    #[tokio::test]
    async fn add_rejects_an_invalid_deployment() {
        let controller = controller();
        let mut deployment = deployment_with_mode(Mode::Single);
        deployment.spec.single.count = Some(2);
        controller.on_add(deployment).await;
        assert_eq!(controller.deployment_count().await, 0);
    }

    #[tokio::test]
    async fn add_is_idempotent_for_the_same_key() {
        let controller = controller();
        controller.on_add(deployment_with_mode(Mode::Single)).await;
        controller.on_add(deployment_with_mode(Mode::Single)).await;
        assert_eq!(controller.deployment_count().await, 1);
    }

    #[tokio::test]
    async fn delete_removes_an_unknown_deployment_without_panicking() {
        let controller = controller();
        controller.on_delete("default", "does-not-exist").await;
        assert_eq!(controller.deployment_count().await, 0);
    }

    #[tokio::test]
    async fn delete_stops_and_deregisters_the_deployment() {
        let controller = controller();
        controller.on_add(deployment_with_mode(Mode::Single)).await;
        assert_eq!(controller.deployment_count().await, 1);
        controller.on_delete("default", "my-depl").await;
        assert_eq!(controller.deployment_count().await, 0);
    }
}

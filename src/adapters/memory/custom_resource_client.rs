//! In-memory `CustomResourceClient` test double, with injectable
//! optimistic-concurrency conflicts so the DM's 10-attempt retry loop
//! (§4.1) can be exercised deterministically.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::errors::{OperatorError, OperatorResult};
use crate::domain::models::{Deployment, DeploymentSpec, DeploymentStatus};
use crate::domain::ports::{CustomResourceClient, DeploymentRef};

#[derive(Debug, Default)]
struct State {
    objects: HashMap<(String, String), Deployment>,
    /// Number of remaining forced conflicts per key, consumed one per write
    /// attempt until exhausted.
    forced_conflicts: HashMap<(String, String), u32>,
    spec_write_count: u32,
    status_write_count: u32,
}

#[derive(Debug, Default)]
pub struct MemoryCustomResourceClient {
    state: Mutex<State>,
}

impl MemoryCustomResourceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, deployment: Deployment) {
        let key = (deployment.namespace.clone(), deployment.name.clone());
        self.state.lock().unwrap().objects.insert(key, deployment);
    }

    pub fn get_snapshot(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn delete(&self, namespace: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .objects
            .remove(&(namespace.to_string(), name.to_string()));
    }

    /// Arms `count` forced `Conflict` responses for the next `count` write
    /// attempts (spec or status) against `(namespace, name)`.
    pub fn force_conflicts(&self, namespace: &str, name: &str, count: u32) {
        self.state
            .lock()
            .unwrap()
            .forced_conflicts
            .insert((namespace.to_string(), name.to_string()), count);
    }

    pub fn spec_write_count(&self) -> u32 {
        self.state.lock().unwrap().spec_write_count
    }

    pub fn status_write_count(&self) -> u32 {
        self.state.lock().unwrap().status_write_count
    }

    fn take_forced_conflict(state: &mut State, key: &(String, String)) -> bool {
        if let Some(remaining) = state.forced_conflicts.get_mut(key) {
            if *remaining > 0 {
                *remaining -= 1;
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl CustomResourceClient for MemoryCustomResourceClient {
    async fn get(&self, deployment_ref: &DeploymentRef) -> OperatorResult<Option<Deployment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .objects
            .get(&(deployment_ref.namespace.clone(), deployment_ref.name.clone()))
            .cloned())
    }

    async fn update_spec(
        &self,
        deployment_ref: &DeploymentRef,
        generation: u64,
        spec: &DeploymentSpec,
    ) -> OperatorResult<()> {
        let mut state = self.state.lock().unwrap();
        let key = (deployment_ref.namespace.clone(), deployment_ref.name.clone());
        state.spec_write_count += 1;

        if Self::take_forced_conflict(&mut state, &key) {
            return Err(OperatorError::Conflict {
                resource: format!("deployment/{}/{}", deployment_ref.namespace, deployment_ref.name),
            });
        }

        let Some(existing) = state.objects.get_mut(&key) else {
            return Err(OperatorError::NotFound {
                resource: format!("deployment/{}/{}", deployment_ref.namespace, deployment_ref.name),
            });
        };
        if existing.generation != generation {
            return Err(OperatorError::Conflict {
                resource: format!("deployment/{}/{}", deployment_ref.namespace, deployment_ref.name),
            });
        }
        existing.spec = spec.clone();
        existing.generation += 1;
        Ok(())
    }

    async fn update_status(
        &self,
        deployment_ref: &DeploymentRef,
        generation: u64,
        status: &DeploymentStatus,
    ) -> OperatorResult<()> {
        let mut state = self.state.lock().unwrap();
        let key = (deployment_ref.namespace.clone(), deployment_ref.name.clone());
        state.status_write_count += 1;

        if Self::take_forced_conflict(&mut state, &key) {
            return Err(OperatorError::Conflict {
                resource: format!("deployment/{}/{}", deployment_ref.namespace, deployment_ref.name),
            });
        }

        let Some(existing) = state.objects.get_mut(&key) else {
            return Err(OperatorError::NotFound {
                resource: format!("deployment/{}/{}", deployment_ref.namespace, deployment_ref.name),
            });
        };
        if existing.generation != generation {
            return Err(OperatorError::Conflict {
                resource: format!("deployment/{}/{}", deployment_ref.namespace, deployment_ref.name),
            });
        }
        if existing.status == *status {
            return Ok(());
        }
        existing.status = status.clone();
        existing.generation += 1;
        Ok(())
    }
}

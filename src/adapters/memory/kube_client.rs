//! In-memory `KubeClient` test double. No network, no real Kubernetes API —
//! just enough bookkeeping to exercise the materializer and reconciler
//! against realistic create/delete/conflict semantics.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::errors::{OperatorError, OperatorResult};
use crate::domain::ports::{
    KubeClient, ObservedService, OperatorEvent, PodSpec, PvcSpec, SecretRef, ServiceSpec,
};

#[derive(Debug, Default)]
struct State {
    pods: HashMap<(String, String), PodSpec>,
    pod_ready: HashMap<(String, String), bool>,
    services: HashMap<(String, String), ObservedService>,
    pvcs: HashMap<(String, String), PvcSpec>,
    secrets: HashMap<(String, String), SecretRef>,
    events: Vec<OperatorEvent>,
}

#[derive(Debug, Default)]
pub struct MemoryKubeClient {
    state: Mutex<State>,
}

impl MemoryKubeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: mark a pod ready/unready without going through a create.
    pub fn set_pod_ready(&self, namespace: &str, name: &str, ready: bool) {
        let mut state = self.state.lock().unwrap();
        state.pod_ready.insert((namespace.to_string(), name.to_string()), ready);
    }

    /// Test hook: simulate a load-balancer ingress assignment.
    pub fn set_load_balancer_ingress(&self, namespace: &str, name: &str, ip: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(svc) = state.services.get_mut(&(namespace.to_string(), name.to_string())) {
            svc.load_balancer_ingress_ip = Some(ip.to_string());
        }
    }

    pub fn events(&self) -> Vec<OperatorEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn pod_count(&self) -> usize {
        self.state.lock().unwrap().pods.len()
    }
}

#[async_trait]
impl KubeClient for MemoryKubeClient {
    async fn create_pod(&self, pod: &PodSpec) -> OperatorResult<()> {
        let mut state = self.state.lock().unwrap();
        let key = (pod.namespace.clone(), pod.name.clone());
        if state.pods.contains_key(&key) {
            return Err(OperatorError::AlreadyExists {
                resource: format!("pod/{}/{}", pod.namespace, pod.name),
            });
        }
        state.pods.insert(key, pod.clone());
        Ok(())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> OperatorResult<()> {
        let mut state = self.state.lock().unwrap();
        let key = (namespace.to_string(), name.to_string());
        if state.pods.remove(&key).is_none() {
            return Err(OperatorError::NotFound {
                resource: format!("pod/{namespace}/{name}"),
            });
        }
        state.pod_ready.remove(&key);
        Ok(())
    }

    async fn get_pod_ready(&self, namespace: &str, name: &str) -> OperatorResult<Option<bool>> {
        let state = self.state.lock().unwrap();
        let key = (namespace.to_string(), name.to_string());
        if !state.pods.contains_key(&key) {
            return Ok(None);
        }
        Ok(Some(state.pod_ready.get(&key).copied().unwrap_or(false)))
    }

    async fn create_service(&self, svc: &ServiceSpec) -> OperatorResult<()> {
        let mut state = self.state.lock().unwrap();
        let key = (svc.namespace.clone(), svc.name.clone());
        if state.services.contains_key(&key) {
            return Err(OperatorError::AlreadyExists {
                resource: format!("service/{}/{}", svc.namespace, svc.name),
            });
        }
        state.services.insert(
            key,
            ObservedService {
                spec: svc.clone(),
                created_at_unix_ms: 0,
                load_balancer_ingress_ip: None,
            },
        );
        Ok(())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> OperatorResult<Option<ObservedService>> {
        let state = self.state.lock().unwrap();
        Ok(state.services.get(&(namespace.to_string(), name.to_string())).cloned())
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> OperatorResult<()> {
        let mut state = self.state.lock().unwrap();
        let key = (namespace.to_string(), name.to_string());
        if state.services.remove(&key).is_none() {
            return Err(OperatorError::NotFound {
                resource: format!("service/{namespace}/{name}"),
            });
        }
        Ok(())
    }

    async fn create_pvc(&self, pvc: &PvcSpec) -> OperatorResult<()> {
        let mut state = self.state.lock().unwrap();
        let key = (pvc.namespace.clone(), pvc.name.clone());
        if state.pvcs.contains_key(&key) {
            return Err(OperatorError::AlreadyExists {
                resource: format!("pvc/{}/{}", pvc.namespace, pvc.name),
            });
        }
        state.pvcs.insert(key, pvc.clone());
        Ok(())
    }

    async fn delete_pvc(&self, namespace: &str, name: &str) -> OperatorResult<()> {
        let mut state = self.state.lock().unwrap();
        let key = (namespace.to_string(), name.to_string());
        if state.pvcs.remove(&key).is_none() {
            return Err(OperatorError::NotFound {
                resource: format!("pvc/{namespace}/{name}"),
            });
        }
        Ok(())
    }

    async fn ensure_secret(&self, secret: &SecretRef) -> OperatorResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .secrets
            .insert((secret.namespace.clone(), secret.name.clone()), secret.clone());
        Ok(())
    }

    async fn create_event(&self, _namespace: &str, _owner_name: &str, event: &OperatorEvent) -> OperatorResult<()> {
        self.state.lock().unwrap().events.push(event.clone());
        Ok(())
    }
}

//! In-memory `DatabaseClient` test double: returns canned version/health/
//! scaling-intent responses, settable per test.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::errors::OperatorResult;
use crate::domain::ports::{ClusterHealth, DatabaseClient, ScalingIntent, VersionInfo};

#[derive(Debug, Default)]
struct State {
    versions: HashMap<(String, String), VersionInfo>,
    health: HashMap<(String, String), ClusterHealth>,
    scaling_intent: HashMap<(String, String), ScalingIntent>,
}

#[derive(Debug, Default)]
pub struct MemoryDatabaseClient {
    state: Mutex<State>,
}

impl MemoryDatabaseClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_version(&self, namespace: &str, name: &str, info: VersionInfo) {
        self.state
            .lock()
            .unwrap()
            .versions
            .insert((namespace.to_string(), name.to_string()), info);
    }

    pub fn set_cluster_health(&self, namespace: &str, name: &str, health: ClusterHealth) {
        self.state
            .lock()
            .unwrap()
            .health
            .insert((namespace.to_string(), name.to_string()), health);
    }

    pub fn set_scaling_intent(&self, namespace: &str, name: &str, intent: ScalingIntent) {
        self.state
            .lock()
            .unwrap()
            .scaling_intent
            .insert((namespace.to_string(), name.to_string()), intent);
    }
}

#[async_trait]
impl DatabaseClient for MemoryDatabaseClient {
    async fn version(&self, namespace: &str, name: &str) -> OperatorResult<VersionInfo> {
        let state = self.state.lock().unwrap();
        Ok(state
            .versions
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .unwrap_or(VersionInfo {
                server: "arango".to_string(),
                version: "3.11.0".to_string(),
            }))
    }

    async fn cluster_health(&self, namespace: &str, name: &str) -> OperatorResult<ClusterHealth> {
        let state = self.state.lock().unwrap();
        Ok(state
            .health
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn scaling_intent(&self, namespace: &str, name: &str) -> OperatorResult<ScalingIntent> {
        let state = self.state.lock().unwrap();
        Ok(state
            .scaling_intent
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

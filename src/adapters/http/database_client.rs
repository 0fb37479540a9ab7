//! Production `DatabaseClient`: a thin `reqwest`-backed client against the
//! database's own HTTP API (§6 "Database endpoints"). Connection pooling
//! and retry are delegated to `reqwest::Client` and the caller's own
//! backoff policy respectively — this adapter only shapes requests and
//! responses.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::errors::OperatorResult;
use crate::domain::ports::{ClusterHealth, DatabaseClient, MemberHealth, ScalingIntent, VersionInfo};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpDatabaseClient {
    http: Client,
    /// Format string for the member-facing endpoint, e.g.
    /// `"https://{name}.{namespace}.svc:8529"`. Namespace/name are
    /// substituted by the caller.
    endpoint_template: String,
}

impl HttpDatabaseClient {
    pub fn new(endpoint_template: impl Into<String>) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint_template: endpoint_template.into(),
        })
    }

    fn endpoint(&self, namespace: &str, name: &str) -> String {
        self.endpoint_template
            .replace("{namespace}", namespace)
            .replace("{name}", name)
    }
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    server: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct ClusterHealthResponse {
    #[serde(rename = "Health")]
    health: BTreeMap<String, ClusterHealthMember>,
}

#[derive(Debug, Deserialize)]
struct ClusterHealthMember {
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Debug, Deserialize)]
struct ScalingIntentResponse {
    #[serde(rename = "NumberOfDBServers")]
    number_of_db_servers: Option<u32>,
    #[serde(rename = "NumberOfCoordinators")]
    number_of_coordinators: Option<u32>,
}

#[async_trait]
impl DatabaseClient for HttpDatabaseClient {
    async fn version(&self, namespace: &str, name: &str) -> OperatorResult<VersionInfo> {
        let url = format!("{}/_api/version", self.endpoint(namespace, name));
        let response: VersionResponse = self.http.get(url).send().await?.error_for_status()?.json().await?;
        Ok(VersionInfo {
            server: response.server,
            version: response.version,
        })
    }

    async fn cluster_health(&self, namespace: &str, name: &str) -> OperatorResult<ClusterHealth> {
        let url = format!("{}/_admin/cluster/health", self.endpoint(namespace, name));
        let response: ClusterHealthResponse = self.http.get(url).send().await?.error_for_status()?.json().await?;
        let members = response
            .health
            .into_iter()
            .map(|(id, member)| {
                let health = match member.status.as_str() {
                    "GOOD" => MemberHealth::Good,
                    "FAILED" => MemberHealth::Failed,
                    _ => MemberHealth::Bad,
                };
                (id, health)
            })
            .collect();
        Ok(ClusterHealth { members })
    }

    async fn scaling_intent(&self, namespace: &str, name: &str) -> OperatorResult<ScalingIntent> {
        let url = format!("{}/_admin/cluster/numberOfServers", self.endpoint(namespace, name));
        let response: ScalingIntentResponse = self.http.get(url).send().await?.error_for_status()?.json().await?;
        let mut desired_counts = BTreeMap::new();
        if let Some(count) = response.number_of_db_servers {
            desired_counts.insert(crate::domain::models::ServerGroup::DBServers, count);
        }
        if let Some(count) = response.number_of_coordinators {
            desired_counts.insert(crate::domain::models::ServerGroup::Coordinators, count);
        }
        Ok(ScalingIntent { desired_counts })
    }
}

//! Production `CustomResourceClient`: full PUT/replace of spec, best-effort
//! deep-equal-skip of status (§6). The generic typed client/informer layer
//! this would sit behind in a real cluster is out of scope (§1); this
//! adapter only needs to round-trip `Deployment` as JSON against whatever
//! REST surface the apiserver exposes for the custom resource.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::domain::errors::{OperatorError, OperatorResult};
use crate::domain::models::{Deployment, DeploymentSpec, DeploymentStatus};
use crate::domain::ports::{CustomResourceClient, DeploymentRef};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpCustomResourceClient {
    http: Client,
    api_server_base_url: String,
}

impl HttpCustomResourceClient {
    pub fn new(api_server_base_url: impl Into<String>) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_server_base_url: api_server_base_url.into(),
        })
    }

    fn url(&self, namespace: &str, name: &str) -> String {
        format!(
            "{}/apis/database.arangodb.com/v1alpha/namespaces/{namespace}/arangodeployments/{name}",
            self.api_server_base_url
        )
    }
}

#[async_trait]
impl CustomResourceClient for HttpCustomResourceClient {
    async fn get(&self, deployment_ref: &DeploymentRef) -> OperatorResult<Option<Deployment>> {
        let response = self
            .http
            .get(self.url(&deployment_ref.namespace, &deployment_ref.name))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let deployment: Deployment = response.error_for_status().map_err(OperatorError::from)?.json().await?;
        Ok(Some(deployment))
    }

    async fn update_spec(
        &self,
        deployment_ref: &DeploymentRef,
        generation: u64,
        spec: &DeploymentSpec,
    ) -> OperatorResult<()> {
        let resource = format!("deployment/{}/{}", deployment_ref.namespace, deployment_ref.name);
        let response = self
            .http
            .put(self.url(&deployment_ref.namespace, &deployment_ref.name))
            .header("If-Match", generation.to_string())
            .json(spec)
            .send()
            .await?;
        match response.status() {
            StatusCode::CONFLICT => Err(OperatorError::Conflict { resource }),
            StatusCode::NOT_FOUND => Err(OperatorError::NotFound { resource }),
            _ => {
                response.error_for_status().map_err(OperatorError::from)?;
                Ok(())
            }
        }
    }

    async fn update_status(
        &self,
        deployment_ref: &DeploymentRef,
        generation: u64,
        status: &DeploymentStatus,
    ) -> OperatorResult<()> {
        let resource = format!("deployment/{}/{}", deployment_ref.namespace, deployment_ref.name);
        let response = self
            .http
            .put(format!(
                "{}/status",
                self.url(&deployment_ref.namespace, &deployment_ref.name)
            ))
            .header("If-Match", generation.to_string())
            .json(status)
            .send()
            .await?;
        match response.status() {
            StatusCode::CONFLICT => Err(OperatorError::Conflict { resource }),
            StatusCode::NOT_FOUND => Err(OperatorError::NotFound { resource }),
            _ => {
                response.error_for_status().map_err(OperatorError::from)?;
                Ok(())
            }
        }
    }
}

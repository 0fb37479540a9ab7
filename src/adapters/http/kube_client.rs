//! Production `KubeClient`: a thin `reqwest`-backed client against a
//! generic Kubernetes-style object API (§1 — the typed, code-generated
//! client and informer machinery are out of scope; this crate only needs
//! CRUD plus conflict/not-found/already-exists classification).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{OperatorError, OperatorResult};
use crate::domain::ports::{
    EventSeverity, HttpProbe, KubeClient, ObservedService, OperatorEvent, PodSpec, PvcSpec,
    SecretRef, ServiceSpec, ServiceType, VolumeMount,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpKubeClient {
    http: Client,
    api_server_base_url: String,
}

impl HttpKubeClient {
    pub fn new(api_server_base_url: impl Into<String>) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_server_base_url: api_server_base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_server_base_url, path)
    }

    fn classify_status(status: StatusCode, resource: String) -> OperatorError {
        match status {
            StatusCode::CONFLICT => OperatorError::Conflict { resource },
            StatusCode::NOT_FOUND => OperatorError::NotFound { resource },
            _ => OperatorError::Transient(format!("{resource}: unexpected status {status}")),
        }
    }
}

#[derive(Debug, Serialize)]
struct PodBody<'a> {
    metadata: ObjectMeta<'a>,
    spec: PodSpecBody<'a>,
}

#[derive(Debug, Serialize)]
struct ObjectMeta<'a> {
    name: &'a str,
    namespace: &'a str,
    owner_uid: &'a str,
}

#[derive(Debug, Serialize)]
struct PodSpecBody<'a> {
    image: &'a str,
    image_pull_policy: &'a str,
    args: &'a [String],
    env: Vec<(&'a str, &'a str)>,
    mounts: &'a [VolumeMount],
    liveness_probe: &'a Option<HttpProbe>,
    readiness_probe: &'a Option<HttpProbe>,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    spec: ServiceResponseSpec,
    created_at_unix_ms: i64,
    load_balancer_ingress_ip: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ServiceResponseSpec {
    name: String,
    namespace: String,
    owner_uid: String,
    #[serde(rename = "type")]
    ty: ServiceResponseType,
    selector: String,
    port: u16,
    load_balancer_ip: Option<String>,
    node_port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum ServiceResponseType {
    ClusterIp,
    Headless,
    LoadBalancer,
    NodePort,
}

fn to_response_type(ty: ServiceType) -> ServiceResponseType {
    match ty {
        ServiceType::ClusterIp => ServiceResponseType::ClusterIp,
        ServiceType::Headless => ServiceResponseType::Headless,
        ServiceType::LoadBalancer => ServiceResponseType::LoadBalancer,
        ServiceType::NodePort => ServiceResponseType::NodePort,
    }
}

fn from_response_type(ty: ServiceResponseType) -> ServiceType {
    match ty {
        ServiceResponseType::ClusterIp => ServiceType::ClusterIp,
        ServiceResponseType::Headless => ServiceType::Headless,
        ServiceResponseType::LoadBalancer => ServiceType::LoadBalancer,
        ServiceResponseType::NodePort => ServiceType::NodePort,
    }
}

#[async_trait]
impl KubeClient for HttpKubeClient {
    async fn create_pod(&self, pod: &PodSpec) -> OperatorResult<()> {
        let resource = format!("pod/{}/{}", pod.namespace, pod.name);
        let body = PodBody {
            metadata: ObjectMeta {
                name: &pod.name,
                namespace: &pod.namespace,
                owner_uid: &pod.owner_uid,
            },
            spec: PodSpecBody {
                image: &pod.image,
                image_pull_policy: &pod.image_pull_policy,
                args: &pod.args,
                env: pod.env.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
                mounts: &pod.mounts,
                liveness_probe: &pod.liveness_probe,
                readiness_probe: &pod.readiness_probe,
            },
        };
        let response = self
            .http
            .post(self.url(&format!("/api/v1/namespaces/{}/pods", pod.namespace)))
            .json(&body)
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(OperatorError::AlreadyExists { resource });
        }
        response.error_for_status().map_err(OperatorError::from)?;
        Ok(())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> OperatorResult<()> {
        let resource = format!("pod/{namespace}/{name}");
        let response = self
            .http
            .delete(self.url(&format!("/api/v1/namespaces/{namespace}/pods/{name}")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(OperatorError::NotFound { resource });
        }
        response.error_for_status().map_err(OperatorError::from)?;
        Ok(())
    }

    async fn get_pod_ready(&self, namespace: &str, name: &str) -> OperatorResult<Option<bool>> {
        let response = self
            .http
            .get(self.url(&format!("/api/v1/namespaces/{namespace}/pods/{name}/status")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        #[derive(Deserialize)]
        struct PodStatus {
            ready: bool,
        }
        let status: PodStatus = response.error_for_status().map_err(OperatorError::from)?.json().await?;
        Ok(Some(status.ready))
    }

    async fn create_service(&self, svc: &ServiceSpec) -> OperatorResult<()> {
        let resource = format!("service/{}/{}", svc.namespace, svc.name);
        let body = ServiceResponseSpec {
            name: svc.name.clone(),
            namespace: svc.namespace.clone(),
            owner_uid: svc.owner_uid.clone(),
            ty: to_response_type(svc.ty),
            selector: svc.selector.clone(),
            port: svc.port,
            load_balancer_ip: svc.load_balancer_ip.clone(),
            node_port: svc.node_port,
        };
        let response = self
            .http
            .post(self.url(&format!("/api/v1/namespaces/{}/services", svc.namespace)))
            .json(&body)
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(OperatorError::AlreadyExists { resource });
        }
        response.error_for_status().map_err(OperatorError::from)?;
        Ok(())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> OperatorResult<Option<ObservedService>> {
        let response = self
            .http
            .get(self.url(&format!("/api/v1/namespaces/{namespace}/services/{name}")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: ServiceResponse = response.error_for_status().map_err(OperatorError::from)?.json().await?;
        Ok(Some(ObservedService {
            spec: ServiceSpec {
                name: body.spec.name,
                namespace: body.spec.namespace,
                owner_uid: body.spec.owner_uid,
                ty: from_response_type(body.spec.ty),
                selector: body.spec.selector,
                port: body.spec.port,
                load_balancer_ip: body.spec.load_balancer_ip,
                node_port: body.spec.node_port,
            },
            created_at_unix_ms: body.created_at_unix_ms,
            load_balancer_ingress_ip: body.load_balancer_ingress_ip,
        }))
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> OperatorResult<()> {
        let resource = format!("service/{namespace}/{name}");
        let response = self
            .http
            .delete(self.url(&format!("/api/v1/namespaces/{namespace}/services/{name}")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(OperatorError::NotFound { resource });
        }
        response.error_for_status().map_err(OperatorError::from)?;
        Ok(())
    }

    async fn create_pvc(&self, pvc: &PvcSpec) -> OperatorResult<()> {
        let resource = format!("pvc/{}/{}", pvc.namespace, pvc.name);
        let response = self
            .http
            .post(self.url(&format!(
                "/api/v1/namespaces/{}/persistentvolumeclaims",
                pvc.namespace
            )))
            .json(pvc_body(pvc))
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(OperatorError::AlreadyExists { resource });
        }
        response.error_for_status().map_err(OperatorError::from)?;
        Ok(())
    }

    async fn delete_pvc(&self, namespace: &str, name: &str) -> OperatorResult<()> {
        let resource = format!("pvc/{namespace}/{name}");
        let response = self
            .http
            .delete(self.url(&format!(
                "/api/v1/namespaces/{namespace}/persistentvolumeclaims/{name}"
            )))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(OperatorError::NotFound { resource });
        }
        response.error_for_status().map_err(OperatorError::from)?;
        Ok(())
    }

    async fn ensure_secret(&self, secret: &SecretRef) -> OperatorResult<()> {
        let response = self
            .http
            .put(self.url(&format!(
                "/api/v1/namespaces/{}/secrets/{}",
                secret.namespace, secret.name
            )))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::classify_status(
                response.status(),
                format!("secret/{}/{}", secret.namespace, secret.name),
            ));
        }
        Ok(())
    }

    async fn create_event(&self, namespace: &str, owner_name: &str, event: &OperatorEvent) -> OperatorResult<()> {
        #[derive(Serialize)]
        struct EventBody<'a> {
            owner_name: &'a str,
            severity: &'static str,
            reason: &'a str,
            message: &'a str,
        }
        let body = EventBody {
            owner_name,
            severity: match event.severity {
                EventSeverity::Normal => "Normal",
                EventSeverity::Warning => "Warning",
            },
            reason: &event.reason,
            message: &event.message,
        };
        self.http
            .post(self.url(&format!("/api/v1/namespaces/{namespace}/events")))
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(OperatorError::from)?;
        Ok(())
    }
}

fn pvc_body(pvc: &PvcSpec) -> serde_json::Value {
    serde_json::json!({
        "name": pvc.name,
        "namespace": pvc.namespace,
        "owner_uid": pvc.owner_uid,
        "storage_class_name": pvc.storage_class_name,
        "storage_request": pvc.storage_request,
    })
}

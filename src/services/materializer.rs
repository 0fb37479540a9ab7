//! Materializes a desired spec (plus observed member status) into concrete
//! runtime objects: services, PVCs, and pods (§4.1 "member/resource
//! materializer"). Grounded on `EnsureServices` (services.go) and
//! `createPodForMember`/`createArangodArgs` (pod_creator.go).

use std::time::{Duration, SystemTime};

use tracing::{debug, info};

use crate::domain::errors::{OperatorError, OperatorResult};
use crate::domain::models::{
    Deployment, DeploymentSpec, ExternalAccessType, MemberList, MemberStatus, Mode, ServerGroup,
};
use crate::domain::ports::{
    HttpProbe, KubeClient, ObservedService, PodSpec, PvcSpec, ServiceSpec, ServiceType, VolumeMount,
};
use crate::services::args::{create_arangod_args, ARANGO_PORT};
use crate::services::pod_suffix::{pod_name, pod_suffix};

/// How long a `LoadBalancer`-typed Auto-access service is given to receive
/// an ingress IP before the materializer demotes it to `NodePort` (§4.2).
const LOAD_BALANCER_GRACE_PERIOD: Duration = Duration::from_secs(60);

fn internal_service_name(deployment_name: &str) -> String {
    deployment_name.to_string()
}

fn external_access_service_name(deployment_name: &str) -> String {
    format!("{deployment_name}-ea")
}

fn sync_master_service_name(deployment_name: &str) -> String {
    format!("{deployment_name}-sync")
}

/// Creates the headless service binding pod DNS, if it does not exist yet.
pub async fn ensure_headless_service(kube: &dyn KubeClient, depl: &Deployment) -> OperatorResult<()> {
    let name = depl.headless_service_name();
    if kube.get_service(&depl.namespace, &name).await?.is_some() {
        return Ok(());
    }
    let svc = ServiceSpec {
        name: name.clone(),
        namespace: depl.namespace.clone(),
        owner_uid: depl.uid.clone(),
        ty: ServiceType::Headless,
        selector: depl.name.clone(),
        port: ARANGO_PORT,
        load_balancer_ip: None,
        node_port: None,
    };
    create_service_tolerating_already_exists(kube, &svc).await?;
    debug!(service = %name, "created headless service");
    Ok(())
}

async fn create_service_tolerating_already_exists(kube: &dyn KubeClient, svc: &ServiceSpec) -> OperatorResult<()> {
    match kube.create_service(svc).await {
        Ok(()) | Err(OperatorError::AlreadyExists { .. }) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Creates the internal database client service (selects Single members in
/// Single/ActiveFailover mode, Coordinators in Cluster mode).
pub async fn ensure_internal_service(kube: &dyn KubeClient, depl: &Deployment) -> OperatorResult<String> {
    let name = internal_service_name(&depl.name);
    if kube.get_service(&depl.namespace, &name).await?.is_none() {
        let svc = ServiceSpec {
            name: name.clone(),
            namespace: depl.namespace.clone(),
            owner_uid: depl.uid.clone(),
            ty: ServiceType::ClusterIp,
            selector: depl.name.clone(),
            port: ARANGO_PORT,
            load_balancer_ip: None,
            node_port: None,
        };
        create_service_tolerating_already_exists(kube, &svc).await?;
        debug!(service = %name, "created database client service");
    }
    Ok(name)
}

fn desired_external_access_type_and_port(spec: &DeploymentSpec) -> (ServiceType, Option<u16>) {
    match spec.external_access.ty {
        ExternalAccessType::None => (ServiceType::ClusterIp, None),
        ExternalAccessType::LoadBalancer | ExternalAccessType::Auto => {
            (ServiceType::LoadBalancer, None)
        }
        ExternalAccessType::NodePort => (ServiceType::NodePort, spec.external_access.node_port),
    }
}

/// Decides whether the existing external-access service needs to be torn
/// down and/or (re)created, mirroring the Auto-type demotion state machine:
/// a `LoadBalancer` that has not been assigned an ingress IP within the
/// grace period is demoted to `NodePort`.
fn external_access_reconciliation(
    spec: &DeploymentSpec,
    existing: Option<&ObservedService>,
    now: SystemTime,
) -> (bool, bool, ServiceType) {
    let requested_ty = spec.external_access.ty;
    let Some(existing) = existing else {
        return (false, !matches!(requested_ty, ExternalAccessType::None), {
            let (ty, _) = desired_external_access_type_and_port(spec);
            ty
        });
    };

    match requested_ty {
        ExternalAccessType::None => (true, false, ServiceType::ClusterIp),
        ExternalAccessType::Auto => {
            if existing.spec.ty == ServiceType::LoadBalancer {
                let old_enough = existing
                    .created_at_unix_ms
                    .checked_add(LOAD_BALANCER_GRACE_PERIOD.as_millis() as i64)
                    .map(|deadline| {
                        let now_ms = now
                            .duration_since(SystemTime::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_millis() as i64;
                        now_ms > deadline
                    })
                    .unwrap_or(false);
                if existing.load_balancer_ingress_ip.is_none() && old_enough {
                    return (true, true, ServiceType::NodePort);
                }
                if let Some(wanted_ip) = &spec.external_access.load_balancer_ip {
                    if existing.spec.load_balancer_ip.as_deref() != Some(wanted_ip.as_str()) {
                        return (true, true, ServiceType::LoadBalancer);
                    }
                }
            } else if existing.spec.ty == ServiceType::NodePort {
                if let Some(wanted_port) = spec.external_access.node_port {
                    if existing.spec.node_port != Some(wanted_port) {
                        return (true, true, ServiceType::NodePort);
                    }
                }
            }
            (false, false, existing.spec.ty)
        }
        ExternalAccessType::LoadBalancer => {
            let mismatched_ip = spec
                .external_access
                .load_balancer_ip
                .as_ref()
                .is_some_and(|ip| existing.spec.load_balancer_ip.as_deref() != Some(ip.as_str()));
            if existing.spec.ty != ServiceType::LoadBalancer || mismatched_ip {
                (true, true, ServiceType::LoadBalancer)
            } else {
                (false, false, ServiceType::LoadBalancer)
            }
        }
        ExternalAccessType::NodePort => {
            let mismatched_port = spec
                .external_access
                .node_port
                .is_some_and(|port| existing.spec.node_port != Some(port));
            if existing.spec.ty != ServiceType::NodePort || mismatched_port {
                (true, true, ServiceType::NodePort)
            } else {
                (false, false, ServiceType::NodePort)
            }
        }
    }
}

pub async fn ensure_external_access_service(kube: &dyn KubeClient, depl: &Deployment) -> OperatorResult<()> {
    let name = external_access_service_name(&depl.name);
    let existing = kube.get_service(&depl.namespace, &name).await?;
    let (delete, create, ty) = external_access_reconciliation(&depl.spec, existing.as_ref(), SystemTime::now());

    if delete {
        info!(service = %name, "removing obsolete database external access service");
        kube.delete_service(&depl.namespace, &name).await?;
    }
    if create {
        let svc = ServiceSpec {
            name: name.clone(),
            namespace: depl.namespace.clone(),
            owner_uid: depl.uid.clone(),
            ty,
            selector: depl.name.clone(),
            port: ARANGO_PORT,
            load_balancer_ip: depl.spec.external_access.load_balancer_ip.clone(),
            node_port: depl.spec.external_access.node_port,
        };
        create_service_tolerating_already_exists(kube, &svc).await?;
        debug!(service = %name, "created database external access service");
    }
    Ok(())
}

pub async fn ensure_sync_master_service(kube: &dyn KubeClient, depl: &Deployment) -> OperatorResult<Option<String>> {
    if !depl.spec.sync.is_enabled() {
        return Ok(None);
    }
    let name = sync_master_service_name(&depl.name);
    if kube.get_service(&depl.namespace, &name).await?.is_none() {
        let svc = ServiceSpec {
            name: name.clone(),
            namespace: depl.namespace.clone(),
            owner_uid: depl.uid.clone(),
            ty: ServiceType::ClusterIp,
            selector: depl.name.clone(),
            port: ARANGO_PORT,
            load_balancer_ip: None,
            node_port: None,
        };
        create_service_tolerating_already_exists(kube, &svc).await?;
        debug!(service = %name, "created syncmasters service");
    }
    Ok(Some(name))
}

/// Ensures every service the Deployment needs, returning the internal and
/// (if sync is enabled) sync service names for status update.
pub async fn ensure_services(kube: &dyn KubeClient, depl: &Deployment) -> OperatorResult<(String, Option<String>)> {
    ensure_headless_service(kube, depl).await?;
    let service_name = ensure_internal_service(kube, depl).await?;
    ensure_external_access_service(kube, depl).await?;
    let sync_service_name = ensure_sync_master_service(kube, depl).await?;
    Ok((service_name, sync_service_name))
}

fn pvc_storage_request(spec: &DeploymentSpec, group: ServerGroup) -> Option<String> {
    spec.get_server_group_spec(group).resources.requests.0.get("storage").cloned()
}

pub async fn ensure_pvc_for_member(
    kube: &dyn KubeClient,
    depl: &Deployment,
    group: ServerGroup,
    member: &MemberStatus,
) -> OperatorResult<()> {
    let Some(storage_request) = pvc_storage_request(&depl.spec, group) else {
        return Ok(());
    };
    if member.persistent_volume_claim_name.is_empty() {
        return Ok(());
    }
    let pvc = PvcSpec {
        name: member.persistent_volume_claim_name.clone(),
        namespace: depl.namespace.clone(),
        owner_uid: depl.uid.clone(),
        storage_class_name: depl.spec.get_server_group_spec(group).storage_class_name.clone(),
        storage_request,
    };
    match kube.create_pvc(&pvc).await {
        Ok(()) | Err(OperatorError::AlreadyExists { .. }) => Ok(()),
        Err(err) => Err(err),
    }
}

fn liveness_probe(spec: &DeploymentSpec, group: ServerGroup, jwt_authorization: &str, monitoring_authorization: Option<&str>) -> Option<HttpProbe> {
    match group {
        ServerGroup::Single | ServerGroup::Agents | ServerGroup::DBServers => Some(HttpProbe {
            path: "/_api/version".to_string(),
            secure: spec.is_secure(),
            authorization: if spec.is_authenticated() {
                jwt_authorization.to_string()
            } else {
                String::new()
            },
        }),
        ServerGroup::Coordinators => None,
        ServerGroup::SyncMasters | ServerGroup::SyncWorkers => {
            monitoring_authorization.map(|auth| HttpProbe {
                path: "/_api/version".to_string(),
                secure: spec.is_secure(),
                authorization: auth.to_string(),
            })
        }
    }
}

fn readiness_probe(spec: &DeploymentSpec, group: ServerGroup, jwt_authorization: &str) -> Option<HttpProbe> {
    if group != ServerGroup::Coordinators {
        return None;
    }
    Some(HttpProbe {
        path: "/_api/version".to_string(),
        secure: spec.is_secure(),
        authorization: if spec.is_authenticated() {
            jwt_authorization.to_string()
        } else {
            String::new()
        },
    })
}

/// Builds and creates the pod for one member, computing pod name/suffix,
/// synthesized args, and probes. Returns the assigned pod name so callers
/// can update member status. `AlreadyExists` is swallowed as success (§7):
/// a pod this deployment already created for this member is not an error.
#[allow(clippy::too_many_arguments)]
pub async fn ensure_pod_for_member(
    kube: &dyn KubeClient,
    depl: &Deployment,
    group: ServerGroup,
    member: &MemberStatus,
    agents: &MemberList,
    image_pull_policy: &str,
    auto_upgrade: bool,
    jwt_authorization: &str,
    monitoring_authorization: Option<&str>,
) -> OperatorResult<String> {
    let suffix = pod_suffix(&depl.spec)?;
    let name = pod_name(&depl.name, group.as_role_abbreviated(), &member.id, &suffix);

    if group.is_arangod() {
        let args = create_arangod_args(
            &depl.name,
            &depl.headless_service_name(),
            &depl.namespace,
            &depl.spec,
            group,
            agents,
            &member.id,
            auto_upgrade,
        );
        let mut mounts = vec![VolumeMount {
            name: "data".to_string(),
            mount_path: "/data".to_string(),
        }];
        if depl.spec.is_secure() {
            mounts.push(VolumeMount {
                name: "tls-keyfile".to_string(),
                mount_path: "/secrets/tls".to_string(),
            });
        }
        if depl.spec.rocks_db.is_encrypted() {
            mounts.push(VolumeMount {
                name: "rocksdb-encryption".to_string(),
                mount_path: "/secrets/rocksdb".to_string(),
            });
        }

        let pod = PodSpec {
            name: name.clone(),
            namespace: depl.namespace.clone(),
            owner_uid: depl.uid.clone(),
            group,
            member_id: member.id.clone(),
            image: depl.spec.image.clone(),
            image_pull_policy: image_pull_policy.to_string(),
            args,
            env: Vec::new(),
            mounts,
            liveness_probe: liveness_probe(&depl.spec, group, jwt_authorization, None),
            readiness_probe: readiness_probe(&depl.spec, group, jwt_authorization),
        };
        create_pod_tolerating_already_exists(kube, &pod).await?;
    } else if group.is_arangosync() {
        // createArangoSyncArgs is an unimplemented stub upstream (pod_creator.go),
        // so there is no per-role argument synthesis to mirror here; only the
        // user's own extra args apply.
        let args = depl.spec.get_server_group_spec(group).args.clone();
        let image = depl
            .spec
            .sync
            .image
            .clone()
            .unwrap_or_else(|| depl.spec.image.clone());

        let pod = PodSpec {
            name: name.clone(),
            namespace: depl.namespace.clone(),
            owner_uid: depl.uid.clone(),
            group,
            member_id: member.id.clone(),
            image,
            image_pull_policy: image_pull_policy.to_string(),
            args,
            env: Vec::new(),
            mounts: Vec::new(),
            liveness_probe: liveness_probe(&depl.spec, group, jwt_authorization, monitoring_authorization),
            readiness_probe: None,
        };
        create_pod_tolerating_already_exists(kube, &pod).await?;
    }

    Ok(name)
}

async fn create_pod_tolerating_already_exists(kube: &dyn KubeClient, pod: &PodSpec) -> OperatorResult<()> {
    match kube.create_pod(pod).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_already_exists() => Ok(()),
        Err(err) => Err(err),
    }
}

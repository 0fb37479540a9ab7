//! The Deployment Manager (DM, §4.1): one worker task per custom resource,
//! grounded exactly on the teacher's `Deployment` type and its
//! `New`/`Update`/`Delete`/`send`/`run`/`handleArangoDeploymentUpdatedEvent`/
//! `updateCRStatus`/`updateCRSpec`/`failOnError`/`reportFailedStatus`.
//!
//! A single-writer worker owns the in-memory `Deployment`; every other
//! collaborator (spec-update notifications, the scaling poll, chaos) only
//! ever reaches it through the bounded event channel or a `Trigger`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::domain::errors::{OperatorError, OperatorResult};
use crate::domain::models::{
    Deployment, DeploymentPhase, MemberConditions, MemberPhase, MemberStatusList, ServerGroup,
};
use crate::domain::ports::{
    CustomResourceClient, DatabaseClient, DeploymentRef, EventSeverity, KubeClient, OperatorEvent,
    SecretRef,
};
use crate::services::materializer;
use crate::services::reconciler::{self, Action};
use crate::services::resilience::{Resilience, ResilienceConfig};
use crate::services::scaling;
use crate::services::triggers::Trigger;
use crate::services::validation;

const DEPLOYMENT_EVENT_QUEUE_SIZE: usize = 256;
const MAX_SPEC_PERSIST_ATTEMPTS: u32 = 10;

/// Tunables the DM needs beyond `(spec, status)` itself. `jwt_authorization`
/// stands in for a pre-minted bearer token; actually minting one from the
/// deployment's JWT secret is an external collaborator this crate does not
/// implement (§1, out of scope).
#[derive(Debug, Clone)]
pub struct DeploymentManagerConfig {
    pub min_inspection_interval: Duration,
    pub max_inspection_interval: Duration,
    pub event_channel_capacity: usize,
    pub image_pull_policy: String,
    pub jwt_authorization: String,
    /// Pre-minted bearer token for the arangosync monitoring liveness probe
    /// (§4.2), same "external collaborator mints this, we just carry it"
    /// shape as `jwt_authorization`.
    pub monitoring_authorization: String,
}

impl Default for DeploymentManagerConfig {
    fn default() -> Self {
        Self {
            min_inspection_interval: Duration::from_secs(1),
            max_inspection_interval: Duration::from_secs(60),
            event_channel_capacity: DEPLOYMENT_EVENT_QUEUE_SIZE,
            image_pull_policy: "IfNotPresent".to_string(),
            jwt_authorization: String::new(),
            monitoring_authorization: String::new(),
        }
    }
}

enum Event {
    SpecUpdated,
}

/// Handle to a running DM worker. Cloning the `Arc` is the supported way to
/// share it between the controller and collaborators such as the chaos
/// monkey loop.
pub struct DeploymentManager {
    deployment_ref: DeploymentRef,
    event_tx: mpsc::Sender<Event>,
    stop_tx: watch::Sender<bool>,
    inspect_trigger: Arc<Trigger>,
    update_trigger: Arc<Trigger>,
    snapshot: Arc<Mutex<Deployment>>,
    join_handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl DeploymentManager {
    /// Validates `initial`, seeds `AcceptedSpec` if absent, and spawns the
    /// worker task. Mirrors the teacher's `New`.
    pub fn spawn(
        mut initial: Deployment,
        kube: Arc<dyn KubeClient>,
        cr: Arc<dyn CustomResourceClient>,
        db: Option<Arc<dyn DatabaseClient>>,
        config: DeploymentManagerConfig,
    ) -> OperatorResult<Arc<Self>> {
        validation::validate(&initial.spec)?;
        if initial.status.accepted_spec.is_none() {
            initial.status.accepted_spec = Some(initial.spec.clone());
        }

        let deployment_ref = DeploymentRef {
            namespace: initial.namespace.clone(),
            name: initial.name.clone(),
        };
        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
        let (stop_tx, stop_rx) = watch::channel(false);
        let inspect_trigger = Arc::new(Trigger::new());
        let update_trigger = Arc::new(Trigger::new());
        let snapshot = Arc::new(Mutex::new(initial.clone()));

        let worker = Worker {
            deployment: initial,
            kube,
            cr,
            db,
            config,
            event_rx,
            stop_rx,
            inspect_trigger: inspect_trigger.clone(),
            update_trigger: update_trigger.clone(),
            resilience: Resilience::new(ResilienceConfig::default()),
            snapshot: snapshot.clone(),
        };
        let join_handle = tokio::spawn(worker.run());

        Ok(Arc::new(Self {
            deployment_ref,
            event_tx,
            stop_tx,
            inspect_trigger,
            update_trigger,
            snapshot,
            join_handle: tokio::sync::Mutex::new(Some(join_handle)),
        }))
    }

    pub fn deployment_ref(&self) -> &DeploymentRef {
        &self.deployment_ref
    }

    /// The most recently observed in-memory state. A snapshot, not a live
    /// view — safe to read from any task.
    pub fn current(&self) -> Deployment {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn members_snapshot(&self) -> MemberStatusList {
        self.snapshot.lock().unwrap().status.members.clone()
    }

    pub fn subscribe_stop(&self) -> watch::Receiver<bool> {
        self.stop_tx.subscribe()
    }

    /// Enqueues a spec-updated notification. Drops the event silently if
    /// the worker has already stopped (§5 "senders to a stopped DM observe
    /// a closed stop signal").
    pub async fn notify_spec_updated(&self) {
        let mut stop_rx = self.stop_tx.subscribe();
        tokio::select! {
            result = self.event_tx.send(Event::SpecUpdated) => {
                if result.is_ok() {
                    let capacity = self.event_tx.max_capacity();
                    let used = capacity - self.event_tx.capacity();
                    if capacity > 0 && used as f64 > capacity as f64 * 0.8 {
                        warn!(used, capacity, "event queue buffer is almost full");
                    }
                }
            }
            _ = stop_rx.changed() => {}
        }
    }

    /// Arms the inspect trigger directly, bypassing the event channel. Used
    /// by pod/PVC/secret/service watch collaborators this crate does not
    /// implement (§1) — kept as the seam they would call through.
    pub fn notify_inspect_needed(&self) {
        self.inspect_trigger.fire();
    }

    /// Stops the worker on its next select, per the teacher's `Delete`.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Stops the worker and waits for its run loop to actually exit, per
    /// §4.7: the DM is only considered removed once the join handle
    /// completes. A second call after the handle has already been taken
    /// (e.g. a racing `on_delete`) is a no-op.
    pub async fn stop_and_join(&self) {
        self.stop();
        let handle = self.join_handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(error = %err, "deployment manager worker task panicked");
            }
        }
    }
}

struct Worker {
    deployment: Deployment,
    kube: Arc<dyn KubeClient>,
    cr: Arc<dyn CustomResourceClient>,
    db: Option<Arc<dyn DatabaseClient>>,
    config: DeploymentManagerConfig,
    event_rx: mpsc::Receiver<Event>,
    stop_rx: watch::Receiver<bool>,
    inspect_trigger: Arc<Trigger>,
    update_trigger: Arc<Trigger>,
    resilience: Resilience,
    snapshot: Arc<Mutex<Deployment>>,
}

impl Worker {
    async fn run(mut self) {
        if self.deployment.status.phase == DeploymentPhase::None {
            self.bootstrap().await;
        }
        self.publish_snapshot();

        let mut inspection_interval = self.config.max_inspection_interval;
        loop {
            tokio::select! {
                _ = self.stop_rx.changed() => {
                    if *self.stop_rx.borrow() {
                        return;
                    }
                }
                maybe_event = self.event_rx.recv() => {
                    match maybe_event {
                        Some(Event::SpecUpdated) => self.update_trigger.fire(),
                        None => return,
                    }
                }
                _ = self.inspect_trigger.wait() => {
                    self.inspect().await;
                    inspection_interval = self.config.min_inspection_interval;
                }
                _ = self.update_trigger.wait() => {
                    if let Err(err) = self.handle_spec_updated().await {
                        self.record_event(EventSeverity::Warning, "SpecUpdateFailed", &err.to_string()).await;
                    }
                    inspection_interval = self.config.min_inspection_interval;
                }
                _ = sleep(inspection_interval) => {
                    self.inspect_trigger.fire();
                    inspection_interval = inspection_interval
                        .mul_f64(1.5)
                        .min(self.config.max_inspection_interval);
                }
            }
            self.publish_snapshot();
        }
    }

    fn publish_snapshot(&self) {
        *self.snapshot.lock().unwrap() = self.deployment.clone();
    }

    async fn bootstrap(&mut self) {
        if let Err(err) = self.ensure_secrets().await {
            self.record_event(EventSeverity::Warning, "EnsureSecretsFailed", &err.to_string())
                .await;
        }

        match materializer::ensure_services(self.kube.as_ref(), &self.deployment).await {
            Ok((service_name, sync_service_name)) => {
                self.deployment.status.service_name = service_name;
                self.deployment.status.sync_service_name = sync_service_name.unwrap_or_default();
            }
            Err(err) => {
                self.record_event(EventSeverity::Warning, "EnsureServicesFailed", &err.to_string())
                    .await;
            }
        }

        let actions = reconciler::ensure_member_records(&mut self.deployment);
        for action in actions {
            if let Action::CreateMember { group, id } = action {
                self.assign_pvc_name_if_needed(group, &id);
                self.materialize_member(group, &id).await;
            }
        }

        self.deployment.status.phase = DeploymentPhase::Running;
        self.persist_status().await;
        info!(namespace = %self.deployment.namespace, name = %self.deployment.name, "start running...");
    }

    async fn ensure_secrets(&self) -> OperatorResult<()> {
        let namespace = &self.deployment.namespace;
        if let Some(name) = &self.deployment.spec.authentication.jwt_secret_name {
            self.kube
                .ensure_secret(&SecretRef { name: name.clone(), namespace: namespace.clone() })
                .await?;
        }
        if self.deployment.spec.is_secure() {
            self.kube
                .ensure_secret(&SecretRef {
                    name: self.deployment.spec.tls.ca_secret_name.clone(),
                    namespace: namespace.clone(),
                })
                .await?;
        }
        if let Some(name) = &self.deployment.spec.rocks_db.encryption.key_secret_name {
            self.kube
                .ensure_secret(&SecretRef { name: name.clone(), namespace: namespace.clone() })
                .await?;
        }
        Ok(())
    }

    fn assign_pvc_name_if_needed(&mut self, group: ServerGroup, id: &str) {
        let deployment_name = self.deployment.name.clone();
        if let Some(member) = self.deployment.status.members.group_mut(group).get_mut(id) {
            if member.persistent_volume_claim_name.is_empty() {
                member.persistent_volume_claim_name =
                    format!("{deployment_name}-{}-{id}-pvc", group.as_role_abbreviated());
            }
        }
    }

    async fn materialize_member(&mut self, group: ServerGroup, id: &str) {
        let Some(member_snapshot) = self.deployment.status.members.group(group).get(id).cloned() else {
            return;
        };

        if let Err(err) =
            materializer::ensure_pvc_for_member(self.kube.as_ref(), &self.deployment, group, &member_snapshot).await
        {
            self.record_event(EventSeverity::Warning, "EnsurePvcFailed", &err.to_string()).await;
            return;
        }

        let agents = self.deployment.status.members.group(ServerGroup::Agents).clone();
        let auto_upgrade = member_snapshot
            .conditions
            .is_true(crate::domain::models::MemberCondition::AutoUpgrade);

        let monitoring_authorization = self
            .deployment
            .spec
            .sync
            .monitoring
            .token_secret_name
            .is_some()
            .then_some(self.config.monitoring_authorization.as_str());

        let result = materializer::ensure_pod_for_member(
            self.kube.as_ref(),
            &self.deployment,
            group,
            &member_snapshot,
            &agents,
            &self.config.image_pull_policy,
            auto_upgrade,
            &self.config.jwt_authorization,
            monitoring_authorization,
        )
        .await;

        match result {
            Ok(pod_name) => {
                if let Some(member) = self.deployment.status.members.group_mut(group).get_mut(id) {
                    member.pod_name = pod_name;
                    member.phase = if auto_upgrade { MemberPhase::Upgrading } else { MemberPhase::Created };
                    member.conditions = MemberConditions::default();
                }
                self.record_event(
                    EventSeverity::Normal,
                    "PodCreated",
                    &format!("created pod for member {id}"),
                )
                .await;
            }
            Err(err) => {
                self.record_event(EventSeverity::Warning, "EnsurePodFailed", &err.to_string()).await;
            }
        }
    }

    /// One steady-state inspection: condition refresh, resilience pass,
    /// reconciliation (replace/scale-down/scale-up), scaling integration,
    /// status persist.
    async fn inspect(&mut self) {
        let now = Instant::now();
        self.refresh_member_conditions().await;

        for group in ServerGroup::ALL {
            let ids: Vec<String> = self.deployment.status.members.group(group).0.iter().map(|m| m.id.clone()).collect();
            for id in ids {
                let should_fail = match self.deployment.status.members.group(group).get(&id) {
                    Some(member) => self.resilience.inspect(member, now),
                    None => false,
                };
                if should_fail {
                    if let Some(member) = self.deployment.status.members.group_mut(group).get_mut(&id) {
                        member.phase = MemberPhase::Failed;
                    }
                }
            }
        }

        let mut old_pod_names = HashMap::new();
        let mut old_pvc_names = HashMap::new();
        for group in ServerGroup::ALL {
            for member in &self.deployment.status.members.group(group).0 {
                old_pod_names.insert(member.id.clone(), member.pod_name.clone());
                old_pvc_names.insert(member.id.clone(), member.persistent_volume_claim_name.clone());
            }
        }

        let mut actions = reconciler::plan_failed_member_replacement(&mut self.deployment);
        actions.extend(reconciler::plan_scale_down(&self.deployment));
        actions.extend(reconciler::ensure_member_records(&mut self.deployment));

        for action in actions {
            match action {
                Action::ReplaceFailedMember { id, .. } => {
                    self.teardown_member_resources(&id, &old_pod_names, &old_pvc_names).await;
                }
                Action::RemoveMember { group, id } => {
                    self.teardown_member_resources(&id, &old_pod_names, &old_pvc_names).await;
                    self.deployment.status.members.group_mut(group).remove(&id);
                }
                Action::CreateMember { group, id } => {
                    self.assign_pvc_name_if_needed(group, &id);
                    self.materialize_member(group, &id).await;
                }
            }
        }

        if let Some(db) = self.db.clone() {
            match scaling::poll_scaling_intent(db.as_ref(), &self.deployment).await {
                Ok(proposal) if !proposal.is_empty() => {
                    let mut scaled = self.deployment.clone();
                    if scaling::apply_scaling_proposal(&mut scaled, &proposal) {
                        debug!("scaling integration updated desired member counts");
                        match self.persist_spec(&scaled.spec).await {
                            Ok(()) => {
                                self.deployment.spec = scaled.spec;
                                self.deployment.status.accepted_spec = Some(self.deployment.spec.clone());
                                self.inspect_trigger.fire();
                            }
                            Err(err) => {
                                self.record_event(EventSeverity::Warning, "ScalingIntentPersistFailed", &err.to_string())
                                    .await;
                            }
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    self.record_event(EventSeverity::Warning, "ScalingIntentPollFailed", &err.to_string())
                        .await;
                }
            }
        }

        self.persist_status().await;
    }

    /// Refreshes `MemberCondition::Ready`/`Terminated` from the real pod
    /// state before `resilience.inspect()` runs on it. Members with no pod
    /// yet (empty `pod_name`) are left untouched.
    async fn refresh_member_conditions(&mut self) {
        let namespace = self.deployment.namespace.clone();
        for group in ServerGroup::ALL {
            let pods: Vec<(String, String)> = self
                .deployment
                .status
                .members
                .group(group)
                .0
                .iter()
                .filter(|m| !m.pod_name.is_empty())
                .map(|m| (m.id.clone(), m.pod_name.clone()))
                .collect();

            for (id, pod_name) in pods {
                let ready = match self.kube.get_pod_ready(&namespace, &pod_name).await {
                    Ok(ready) => ready,
                    Err(err) => {
                        warn!(error = %err, pod = %pod_name, "failed to refresh pod readiness");
                        continue;
                    }
                };
                if let Some(member) = self.deployment.status.members.group_mut(group).get_mut(&id) {
                    match ready {
                        Some(true) => {
                            member.conditions.set(crate::domain::models::MemberCondition::Ready);
                            member.conditions.remove(crate::domain::models::MemberCondition::Terminated);
                        }
                        Some(false) => {
                            member.conditions.remove(crate::domain::models::MemberCondition::Ready);
                        }
                        None => {
                            member.conditions.remove(crate::domain::models::MemberCondition::Ready);
                            member.conditions.set(crate::domain::models::MemberCondition::Terminated);
                        }
                    }
                }
            }
        }
    }

    async fn teardown_member_resources(
        &self,
        id: &str,
        old_pod_names: &HashMap<String, String>,
        old_pvc_names: &HashMap<String, String>,
    ) {
        if let Some(pod_name) = old_pod_names.get(id).filter(|n| !n.is_empty()) {
            if let Err(err) = self.kube.delete_pod(&self.deployment.namespace, pod_name).await {
                if !err.is_not_found() {
                    self.record_event(EventSeverity::Warning, "DeletePodFailed", &err.to_string()).await;
                }
            }
        }
        if let Some(pvc_name) = old_pvc_names.get(id).filter(|n| !n.is_empty()) {
            if let Err(err) = self.kube.delete_pvc(&self.deployment.namespace, pvc_name).await {
                if !err.is_not_found() {
                    self.record_event(EventSeverity::Warning, "DeletePvcFailed", &err.to_string()).await;
                }
            }
        }
    }

    /// Mirrors `handleArangoDeploymentUpdatedEvent`: re-fetch, merge
    /// defaults from the previously accepted spec, reset immutable fields,
    /// validate, persist or restore.
    async fn handle_spec_updated(&mut self) -> OperatorResult<()> {
        let deployment_ref = DeploymentRef {
            namespace: self.deployment.namespace.clone(),
            name: self.deployment.name.clone(),
        };
        let Some(current) = self.cr.get(&deployment_ref).await? else {
            return Ok(());
        };

        let spec_before = self
            .deployment
            .status
            .accepted_spec
            .clone()
            .unwrap_or_else(|| self.deployment.spec.clone());

        let mut candidate_spec = current.spec.clone();
        validation::set_defaults_from(&mut candidate_spec, &spec_before);
        let reset_fields = validation::reset_immutable_fields(&spec_before, &mut candidate_spec);
        for field in &reset_fields {
            debug!(field, "reset modified immutable field");
            self.record_event(
                EventSeverity::Warning,
                "ImmutableFieldReset",
                &format!("field {field} was reset to its accepted value"),
            )
            .await;
        }

        if let Err(err) = validation::validate(&candidate_spec) {
            self.record_event(EventSeverity::Warning, "ValidationFailed", &err.to_string()).await;
            let original_spec = self.deployment.spec.clone();
            if let Err(restore_err) = self.persist_spec(&original_spec).await {
                self.record_event(EventSeverity::Warning, "RestoreOriginalFailed", &restore_err.to_string())
                    .await;
                self.fail_on_error(&restore_err, "failed to restore original spec after validation failure")
                    .await;
            }
            return Ok(());
        }

        self.persist_spec(&candidate_spec).await?;
        self.deployment.spec = candidate_spec.clone();
        self.deployment.status.accepted_spec = Some(candidate_spec);
        self.persist_status().await;

        self.inspect_trigger.fire();
        Ok(())
    }

    /// Full replace of spec, retrying on conflict with a fresh read, bounded
    /// to `MAX_SPEC_PERSIST_ATTEMPTS` (§4.1, §5).
    async fn persist_spec(&mut self, spec: &crate::domain::models::DeploymentSpec) -> OperatorResult<()> {
        let deployment_ref = DeploymentRef {
            namespace: self.deployment.namespace.clone(),
            name: self.deployment.name.clone(),
        };
        let mut generation = self.deployment.generation;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.cr.update_spec(&deployment_ref, generation, spec).await {
                Ok(()) => {
                    self.deployment.generation = generation + 1;
                    return Ok(());
                }
                Err(err) if err.is_conflict() && attempt < MAX_SPEC_PERSIST_ATTEMPTS => {
                    match self.cr.get(&deployment_ref).await? {
                        Some(current) => {
                            generation = current.generation;
                            continue;
                        }
                        None => return Ok(()),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Replace status, retrying on conflict the same way. Best-effort: a
    /// failure here is logged, not propagated, since status is
    /// reconstructible on the next inspection.
    async fn persist_status(&mut self) {
        let deployment_ref = DeploymentRef {
            namespace: self.deployment.namespace.clone(),
            name: self.deployment.name.clone(),
        };
        let mut generation = self.deployment.generation;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.cr.update_status(&deployment_ref, generation, &self.deployment.status).await {
                Ok(()) => {
                    self.deployment.generation = generation + 1;
                    return;
                }
                Err(err) if err.is_not_found() => return,
                Err(err) if err.is_conflict() && attempt < MAX_SPEC_PERSIST_ATTEMPTS => {
                    match self.cr.get(&deployment_ref).await {
                        Ok(Some(current)) => generation = current.generation,
                        Ok(None) => return,
                        Err(_) => return,
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to patch deployment status");
                    return;
                }
            }
        }
    }

    /// Reports the deployment as terminally failed, the way
    /// `reportFailedStatus` keeps retrying for up to a year, tolerating
    /// not-found as success.
    async fn report_failed_status(&mut self) {
        self.deployment.status.phase = DeploymentPhase::Failed;
        let deployment_ref = DeploymentRef {
            namespace: self.deployment.namespace.clone(),
            name: self.deployment.name.clone(),
        };
        let mut generation = self.deployment.generation;
        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_secs(1))
            .with_max_interval(Duration::from_secs(5 * 60))
            .with_max_elapsed_time(Some(Duration::from_secs(365 * 24 * 3600)))
            .build();

        loop {
            match self.cr.update_status(&deployment_ref, generation, &self.deployment.status).await {
                Ok(()) => {
                    self.deployment.generation = generation + 1;
                    return;
                }
                Err(err) if err.is_not_found() => return,
                Err(err) if err.is_conflict() => match self.cr.get(&deployment_ref).await {
                    Ok(Some(current)) => generation = current.generation,
                    Ok(None) => return,
                    Err(_) => {}
                },
                Err(err) => warn!(error = %err, "retry report status: failed to update"),
            }
            match backoff.next_backoff() {
                Some(delay) => sleep(delay).await,
                None => return,
            }
        }
    }

    async fn fail_on_error(&mut self, err: &OperatorError, msg: &str) {
        error!(error = %err, "{msg}");
        self.deployment.status.reason = Some(err.to_string());
        self.report_failed_status().await;
    }

    async fn record_event(&self, severity: EventSeverity, reason: &str, message: &str) {
        let event = OperatorEvent {
            severity,
            reason: reason.to_string(),
            message: message.to_string(),
        };
        if let Err(err) = self.kube.create_event(&self.deployment.namespace, &self.deployment.name, &event).await {
            error!(error = %err, reason, "failed to record event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryCustomResourceClient, MemoryKubeClient};
    use crate::domain::models::{DeploymentSpec, DeploymentStatus, Mode};

    fn bootstrap_deployment(mode: Mode) -> Deployment {
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

    fn test_config() -> DeploymentManagerConfig {
        DeploymentManagerConfig {
            min_inspection_interval: Duration::from_millis(20),
            max_inspection_interval: Duration::from_millis(200),
            ..Default::default()
        }
    }

    async fn setup() -> (Arc<DeploymentManager>, Arc<MemoryKubeClient>, Arc<MemoryCustomResourceClient>) {
        let kube = Arc::new(MemoryKubeClient::new());
        let cr = Arc::new(MemoryCustomResourceClient::new());
        let deployment = bootstrap_deployment(Mode::Single);
        cr.insert(deployment.clone());

        let dm = DeploymentManager::spawn(deployment, kube.clone(), cr.clone(), None, test_config()).unwrap();
        (dm, kube, cr)
    }

    #[tokio::test]
    async fn bootstrap_creates_a_pod_and_reports_running() {
        let (dm, kube, _cr) = setup().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(kube.pod_count(), 1);
        let current = dm.current();
        assert_eq!(current.status.phase, DeploymentPhase::Running);
        assert_eq!(current.status.members.single.0.len(), 1);
    }

    #[tokio::test]
    async fn invalid_spec_update_is_rejected_and_original_is_restored() {
        let (dm, _kube, cr) = setup().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let mut updated = cr.get_snapshot("default", "my-depl").unwrap();
        updated.spec.single.count = Some(5);
        cr.insert(updated);

        dm.notify_spec_updated().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let current = dm.current();
        assert_eq!(current.spec.single.count, Some(1));
        let restored = cr.get_snapshot("default", "my-depl").unwrap();
        assert_eq!(restored.spec.single.count, Some(1));
    }

    #[tokio::test]
    async fn valid_spec_update_is_accepted() {
        let (dm, _kube, cr) = setup().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let mut updated = cr.get_snapshot("default", "my-depl").unwrap();
        updated.spec.image_pull_policy = "Always".to_string();
        cr.insert(updated);

        dm.notify_spec_updated().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let current = dm.current();
        assert_eq!(current.spec.image_pull_policy, "Always");
    }

    #[tokio::test]
    async fn status_persistence_survives_forced_conflicts() {
        let (dm, _kube, cr) = setup().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        cr.force_conflicts("default", "my-depl", 3);
        dm.notify_inspect_needed();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cr.status_write_count() >= 4);
    }
}

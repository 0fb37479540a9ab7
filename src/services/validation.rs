//! Pure functions over `DeploymentSpec` (§4.4): validation, defaulting, and
//! immutable-field enforcement. Grounded exactly on `ServerGroupSpec`'s
//! `Validate`/`SetDefaults`/`SetDefaultsFrom`/`ResetImmutableFields`,
//! applied to every group of a `DeploymentSpec`.

use crate::domain::errors::{OperatorError, OperatorResult};
use crate::domain::models::{DeploymentSpec, Environment, Mode, ServerGroup, ServerGroupSpec};

const DEFAULT_STORAGE_REQUEST: &str = "8Gi";
const STORAGE_REQUEST_KEY: &str = "storage";

fn has_persistent_storage(group: ServerGroup) -> bool {
    matches!(group, ServerGroup::Single | ServerGroup::Agents | ServerGroup::DBServers)
}

fn min_count(group: ServerGroup, mode: Mode, env: Environment) -> u32 {
    if env != Environment::Production {
        return 1;
    }
    match group {
        ServerGroup::Single if mode == Mode::ActiveFailover => 2,
        ServerGroup::Agents => 3,
        ServerGroup::DBServers | ServerGroup::Coordinators | ServerGroup::SyncMasters | ServerGroup::SyncWorkers => 2,
        _ => 1,
    }
}

fn validate_group(
    group_spec: &ServerGroupSpec,
    group: ServerGroup,
    used: bool,
    mode: Mode,
    env: Environment,
) -> OperatorResult<()> {
    if used {
        let min = min_count(group, mode, env);
        if group_spec.count() < min {
            return Err(OperatorError::Validation(format!(
                "invalid count value {}. expected >= {min}",
                group_spec.count()
            )));
        }
        if group_spec.count() > 1 && group == ServerGroup::Single && mode == Mode::Single {
            return Err(OperatorError::Validation(format!(
                "invalid count value {}. expected 1",
                group_spec.count()
            )));
        }
    } else if group_spec.count() != 0 {
        return Err(OperatorError::Validation(format!(
            "invalid count value {} for un-used group. expected 0",
            group_spec.count()
        )));
    }
    Ok(())
}

/// First violation across all groups, or `Ok(())` if the whole spec is valid.
pub fn validate(spec: &DeploymentSpec) -> OperatorResult<()> {
    for group in ServerGroup::ALL {
        validate_group(
            spec.get_server_group_spec(group),
            group,
            spec.group_is_used(group),
            spec.mode,
            spec.environment,
        )?;
    }
    Ok(())
}

fn set_group_defaults(group_spec: &mut ServerGroupSpec, group: ServerGroup, used: bool, mode: Mode) {
    if group_spec.count() == 0 && used {
        let default_count = match group {
            ServerGroup::Single if mode == Mode::Single => 1,
            ServerGroup::Single => 2,
            _ => 3,
        };
        group_spec.count = Some(default_count);
    }
    if has_persistent_storage(group) && !group_spec.resources.requests.0.contains_key(STORAGE_REQUEST_KEY) {
        group_spec
            .resources
            .requests
            .0
            .insert(STORAGE_REQUEST_KEY.to_string(), DEFAULT_STORAGE_REQUEST.to_string());
    }
}

/// Fills every group's unspecified fields with mode-derived defaults.
pub fn set_defaults(spec: &mut DeploymentSpec) {
    let mode = spec.mode;
    for group in ServerGroup::ALL {
        let used = spec.group_is_used(group);
        set_group_defaults(spec.get_server_group_spec_mut(group), group, used, mode);
    }
}

/// Fills unspecified fields of `spec` from `source` (the previously accepted
/// spec), group by group. Used when merging an incoming update on top of
/// what is already running.
pub fn set_defaults_from(spec: &mut DeploymentSpec, source: &DeploymentSpec) {
    for group in ServerGroup::ALL {
        let source_group = source.get_server_group_spec(group).clone();
        spec.get_server_group_spec_mut(group).set_defaults_from(&source_group);
    }
}

/// Rolls back any change to an immutable field in `candidate`, restoring
/// the value from `accepted`. Returns the dotted field paths that were
/// reset, for logging/events.
pub fn reset_immutable_fields(accepted: &DeploymentSpec, candidate: &mut DeploymentSpec) -> Vec<String> {
    let mut reset_fields = Vec::new();
    for group in ServerGroup::ALL {
        let source_group = accepted.get_server_group_spec(group);
        let prefix = group.as_role();

        if group == ServerGroup::Agents {
            let target_count = candidate.get_server_group_spec(group).count();
            if source_group.count() != target_count {
                candidate.get_server_group_spec_mut(group).count = source_group.count;
                reset_fields.push(format!("{prefix}.count"));
            }
        }

        let source_storage_class = source_group.storage_class_name.clone();
        let target_storage_class = candidate.get_server_group_spec(group).storage_class_name.clone();
        if source_storage_class != target_storage_class {
            candidate.get_server_group_spec_mut(group).storage_class_name = source_storage_class;
            reset_fields.push(format!("{prefix}.storageClassName"));
        }
    }
    reset_fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_spec(mode: Mode) -> DeploymentSpec {
        DeploymentSpec {
            mode,
            environment: Environment::Development,
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
        }
    }

    #[test]
    fn defaults_then_validate_passes_for_single_mode() {
        let mut spec = minimal_spec(Mode::Single);
        set_defaults(&mut spec);
        assert_eq!(spec.single.count(), 1);
        validate(&spec).unwrap();
    }

    #[test]
    fn defaults_then_validate_passes_for_cluster_mode() {
        let mut spec = minimal_spec(Mode::Cluster);
        set_defaults(&mut spec);
        assert_eq!(spec.agents.count(), 3);
        assert_eq!(spec.db_servers.count(), 3);
        assert_eq!(spec.coordinators.count(), 3);
        assert_eq!(spec.single.count(), 0);
        validate(&spec).unwrap();
    }

    #[test]
    fn single_mode_rejects_count_above_one() {
        let mut spec = minimal_spec(Mode::Single);
        set_defaults(&mut spec);
        spec.single.count = Some(2);
        let err = validate(&spec).unwrap_err();
        assert!(matches!(err, OperatorError::Validation(_)));
    }

    #[test]
    fn production_agents_require_at_least_three() {
        let mut spec = minimal_spec(Mode::Cluster);
        spec.environment = Environment::Production;
        spec.agents.count = Some(2);
        spec.db_servers.count = Some(2);
        spec.coordinators.count = Some(2);
        let err = validate(&spec).unwrap_err();
        assert!(matches!(err, OperatorError::Validation(_)));
    }

    #[test]
    fn unused_group_with_nonzero_count_is_rejected() {
        let mut spec = minimal_spec(Mode::Single);
        spec.agents.count = Some(1);
        let err = validate(&spec).unwrap_err();
        assert!(matches!(err, OperatorError::Validation(_)));
    }

    #[test]
    fn reset_immutable_fields_restores_agent_count_and_storage_class() {
        let mut accepted = minimal_spec(Mode::Cluster);
        set_defaults(&mut accepted);
        accepted.agents.storage_class_name = Some("fast".to_string());

        let mut candidate = accepted.clone();
        candidate.agents.count = Some(99);
        candidate.db_servers.storage_class_name = Some("slow".to_string());

        let reset = reset_immutable_fields(&accepted, &mut candidate);
        assert!(reset.contains(&"agent.count".to_string()));
        assert!(reset.contains(&"dbserver.storageClassName".to_string()));
        assert_eq!(candidate.agents.count(), accepted.agents.count());
        assert_eq!(candidate.db_servers.storage_class_name, accepted.db_servers.storage_class_name);
    }

    #[test]
    fn reset_immutable_fields_is_idempotent() {
        let mut accepted = minimal_spec(Mode::Cluster);
        set_defaults(&mut accepted);
        let mut candidate = accepted.clone();
        candidate.agents.count = Some(7);

        let first = reset_immutable_fields(&accepted, &mut candidate);
        assert!(!first.is_empty());
        let second = reset_immutable_fields(&accepted, &mut candidate);
        assert!(second.is_empty());
    }
}

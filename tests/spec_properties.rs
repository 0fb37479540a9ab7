//! Property-based tests over the pure validation/defaulting/immutability
//! functions, generalizing the example-based unit tests in
//! `services::validation` across arbitrary modes, environments, and counts.

use proptest::prelude::*;

use arangodb_operator::domain::models::{DeploymentSpec, Environment, Mode, ServerGroup};
use arangodb_operator::services::validation::{reset_immutable_fields, set_defaults, validate};

fn minimal_spec(mode: Mode, environment: Environment) -> DeploymentSpec {
    DeploymentSpec {
        mode,
        environment,
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

fn arbitrary_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Single), Just(Mode::ActiveFailover), Just(Mode::Cluster)]
}

fn arbitrary_environment() -> impl Strategy<Value = Environment> {
    prop_oneof![Just(Environment::Development), Just(Environment::Production)]
}

proptest! {
    /// Defaulting a spec with every count left unset always yields a spec
    /// that passes validation, for any mode/environment combination.
    #[test]
    fn prop_defaulting_a_minimal_spec_is_always_valid(
        mode in arbitrary_mode(),
        environment in arbitrary_environment(),
    ) {
        let mut spec = minimal_spec(mode, environment);
        set_defaults(&mut spec);
        prop_assert!(validate(&spec).is_ok());
    }

    /// Resetting immutable fields is idempotent: applying it a second time
    /// to its own output is always a no-op, regardless of which field was
    /// perturbed or by how much.
    #[test]
    fn prop_reset_immutable_fields_is_idempotent(
        agent_count in 0u32..50,
        storage_class in "[a-z]{1,8}",
    ) {
        let mut accepted = minimal_spec(Mode::Cluster, Environment::Development);
        set_defaults(&mut accepted);
        accepted.db_servers.storage_class_name = Some("accepted-class".to_string());

        let mut candidate = accepted.clone();
        candidate.agents.count = Some(agent_count);
        candidate.db_servers.storage_class_name = Some(storage_class);

        let first = reset_immutable_fields(&accepted, &mut candidate);
        let second = reset_immutable_fields(&accepted, &mut candidate);
        prop_assert!(second.is_empty(), "a second pass must find nothing left to reset: {:?}", first);
        prop_assert_eq!(candidate.agents.count(), accepted.agents.count());
        prop_assert_eq!(candidate.db_servers.storage_class_name.clone(), accepted.db_servers.storage_class_name.clone());
    }

    /// Resetting immutable fields never touches a group's non-immutable
    /// fields (args, resource requests) even when count/storageClassName
    /// are perturbed.
    #[test]
    fn prop_reset_immutable_fields_leaves_mutable_fields_alone(
        agent_count in 0u32..50,
    ) {
        let mut accepted = minimal_spec(Mode::Cluster, Environment::Development);
        set_defaults(&mut accepted);
        accepted.db_servers.args = vec!["--some.flag".to_string()];

        let mut candidate = accepted.clone();
        candidate.agents.count = Some(agent_count);
        candidate.db_servers.args = vec!["--changed.flag".to_string()];

        reset_immutable_fields(&accepted, &mut candidate);
        prop_assert_eq!(candidate.db_servers.args, vec!["--changed.flag".to_string()]);
    }

    /// An unused group with a nonzero count is always rejected, for any
    /// mode where that group is unused.
    #[test]
    fn prop_unused_group_nonzero_count_is_rejected(count in 1u32..10) {
        let mut spec = minimal_spec(Mode::Single, Environment::Development);
        set_defaults(&mut spec);
        // Agents are unused in Single mode.
        prop_assert!(!spec.group_is_used(ServerGroup::Agents));
        spec.agents.count = Some(count);
        prop_assert!(validate(&spec).is_err());
    }
}

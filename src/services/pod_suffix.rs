//! Pod naming suffix: a stable, spec-derived tag appended to a member's pod
//! name so that changing the spec (and therefore, potentially, the pod's
//! resource requirements or arguments) produces a new name instead of
//! silently reusing the old one.
//!
//! Grounded exactly on `createPodSuffix`: canonical JSON encoding of the
//! spec, SHA-1 over the bytes, first 6 hex characters.

use sha1::{Digest, Sha1};

use crate::domain::errors::OperatorResult;
use crate::domain::models::DeploymentSpec;

/// Canonical JSON form of `spec`: `serde_json::Value`'s default map type is
/// `BTreeMap`-backed (the `preserve_order` feature is not enabled), so field
/// order in the output is always sorted by key regardless of struct
/// declaration order. That sortedness is what makes the hash stable across
/// serializer/field-reordering changes.
pub fn canonical_spec_bytes(spec: &DeploymentSpec) -> OperatorResult<Vec<u8>> {
    let value = serde_json::to_value(spec)?;
    Ok(serde_json::to_vec(&value)?)
}

/// First 6 hex characters of the SHA-1 digest of the canonical spec bytes.
pub fn pod_suffix(spec: &DeploymentSpec) -> OperatorResult<String> {
    let bytes = canonical_spec_bytes(spec)?;
    let digest = Sha1::digest(&bytes);
    let hex = format!("{digest:x}");
    Ok(hex[..6].to_string())
}

/// Full pod name: `<deployment>-<role-abbreviated>-<member-id>-<suffix>`.
pub fn pod_name(deployment_name: &str, role_abbreviated: &str, member_id: &str, suffix: &str) -> String {
    format!("{deployment_name}-{role_abbreviated}-{member_id}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Mode;

    fn base_spec() -> DeploymentSpec {
        DeploymentSpec {
            mode: Mode::Single,
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
        }
    }

    #[test]
    fn suffix_is_six_hex_chars() {
        let suffix = pod_suffix(&base_spec()).unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn suffix_is_stable_for_identical_specs() {
        let a = pod_suffix(&base_spec()).unwrap();
        let b = pod_suffix(&base_spec()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn suffix_changes_when_spec_changes() {
        let mut other = base_spec();
        other.image = "arangodb/arangodb:3.12".to_string();
        assert_ne!(pod_suffix(&base_spec()).unwrap(), pod_suffix(&other).unwrap());
    }
}

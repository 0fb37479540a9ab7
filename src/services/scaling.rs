//! Scaling integration (§4.5, cluster mode only): bridges externally driven
//! scaling hints from the running database's own cluster management with
//! the operator's spec. Races between a concurrent operator-side spec
//! update and a database-side scaling intent are serialized by the DM's
//! single-writer event loop (§9 Open Question: last writer wins).

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::errors::OperatorResult;
use crate::domain::models::{Deployment, Mode, ServerGroup};
use crate::domain::ports::{DatabaseClient, ScalingIntent};

/// Desired counts the DM should attempt to fold into a spec update, derived
/// from comparing the cluster's own scaling intent against the currently
/// accepted spec. Only cluster-mode groups are considered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScalingProposal {
    pub desired_counts: BTreeMap<ServerGroup, u32>,
}

impl ScalingProposal {
    pub fn is_empty(&self) -> bool {
        self.desired_counts.is_empty()
    }
}

/// Polls the database for scaling intent and returns the subset that
/// differs from what is currently accepted. Returns an empty proposal
/// outside cluster mode.
pub async fn poll_scaling_intent(
    db: &dyn DatabaseClient,
    depl: &Deployment,
) -> OperatorResult<ScalingProposal> {
    if depl.spec.mode != Mode::Cluster {
        return Ok(ScalingProposal::default());
    }

    let ScalingIntent { desired_counts } = db.scaling_intent(&depl.namespace, &depl.name).await?;
    let mut proposal = BTreeMap::new();
    for (group, &desired) in &desired_counts {
        if !matches!(group, ServerGroup::DBServers | ServerGroup::Coordinators) {
            continue;
        }
        let current = depl.spec.get_server_group_spec(*group).count();
        if current != desired {
            debug!(group = ?group, current, desired, "cluster requested a different member count");
            proposal.insert(*group, desired);
        }
    }
    Ok(ScalingProposal { desired_counts: proposal })
}

/// Applies a scaling proposal onto a spec in place, returning whether
/// anything changed.
pub fn apply_scaling_proposal(depl: &mut Deployment, proposal: &ScalingProposal) -> bool {
    let mut changed = false;
    for (&group, &count) in &proposal.desired_counts {
        let group_spec = depl.spec.get_server_group_spec_mut(group);
        if group_spec.count() != count {
            group_spec.count = Some(count);
            changed = true;
        }
    }
    changed
}

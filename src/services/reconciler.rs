//! Computes a plan (ordered list of actions) from (desired spec, observed
//! member status) and creates/replaces members accordingly (§2, §4.1
//! "createInitialMembers" plus ongoing reconciliation).
//!
//! Member identity is a stable random string (§3). The original generates
//! this via a short random-string generator that has no equivalent in this
//! crate's dependency set; `uuid::Uuid::new_v4()` (already a dependency for
//! other identity purposes) truncated to its first 8 hex characters is used
//! instead — collision probability is negligible at the member counts this
//! system deals with, and uniqueness is enforced on insert regardless.

use uuid::Uuid;

use crate::domain::models::{Deployment, MemberList, MemberPhase, MemberStatus, ServerGroup};

/// One step of convergence the DM should carry out. The reconciler only
/// decides what to do; the materializer (§4.2) and DM (§4.1) carry the
/// action out against the real ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A new member needs a pod/PVC created for it.
    CreateMember { group: ServerGroup, id: String },
    /// An existing member in `Failed` phase needs its pod (and, if the
    /// storage class changed, its PVC) deleted and a replacement spawned.
    ReplaceFailedMember { group: ServerGroup, id: String },
    /// A member beyond the desired count needs to be scaled down.
    RemoveMember { group: ServerGroup, id: String },
}

fn generate_member_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Ensures each used group has exactly as many member records as its spec
/// requests, creating fresh `MemberStatus` entries (with freshly generated
/// IDs) as needed. Mirrors the bootstrap-time `createInitialMembers` step,
/// and doubles as the ongoing scale-up path.
pub fn ensure_member_records(depl: &mut Deployment) -> Vec<Action> {
    let mut actions = Vec::new();
    for group in ServerGroup::ALL {
        if !depl.spec.group_is_used(group) {
            continue;
        }
        let desired = depl.spec.get_server_group_spec(group).count();
        let list = depl.status.members.group_mut(group);
        while (list.0.len() as u32) < desired {
            let id = generate_member_id();
            list.0.push(MemberStatus::new(id.clone()));
            actions.push(Action::CreateMember { group, id });
        }
    }
    actions
}

/// Scale-down path: for every used group whose member count exceeds the
/// desired count, marks the excess members (oldest-index-last, so newest
/// members are removed first) for removal. Pure planning step; the caller
/// is responsible for actually deleting pods/PVCs and removing the status
/// entries once the corresponding action has executed.
pub fn plan_scale_down(depl: &Deployment) -> Vec<Action> {
    let mut actions = Vec::new();
    for group in ServerGroup::ALL {
        let desired = depl.spec.get_server_group_spec(group).count() as usize;
        let list = depl.status.members.group(group);
        if list.0.len() > desired {
            for member in list.0.iter().skip(desired) {
                actions.push(Action::RemoveMember {
                    group,
                    id: member.id.clone(),
                });
            }
        }
    }
    actions
}

/// Replacement path (§4.6): any member marked `Failed` by resilience is
/// replaced with a fresh member record carrying a new ID; the old record
/// is dropped from status once the replacement action is planned.
pub fn plan_failed_member_replacement(depl: &mut Deployment) -> Vec<Action> {
    let mut actions = Vec::new();
    for group in ServerGroup::ALL {
        let failed_ids: Vec<String> = depl
            .status
            .members
            .group(group)
            .0
            .iter()
            .filter(|m| m.phase == MemberPhase::Failed)
            .map(|m| m.id.clone())
            .collect();

        for id in failed_ids {
            actions.push(Action::ReplaceFailedMember {
                group,
                id: id.clone(),
            });
            let list = depl.status.members.group_mut(group);
            list.remove(&id);
            let new_id = generate_member_id();
            list.0.push(MemberStatus::new(new_id.clone()));
            actions.push(Action::CreateMember { group, id: new_id });
        }
    }
    actions
}

/// Members of a group that currently have `Phase::None`, i.e. need a pod
/// created (§4.2 "one per member whose Phase = None").
pub fn members_needing_pods(list: &MemberList) -> impl Iterator<Item = &MemberStatus> {
    list.0.iter().filter(|m| m.phase == MemberPhase::None)
}

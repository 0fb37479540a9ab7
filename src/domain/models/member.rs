//! Per-member status: identity, lifecycle phase, and conditions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::deployment::ServerGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberPhase {
    None,
    Created,
    Upgrading,
    Failed,
}

impl Default for MemberPhase {
    fn default() -> Self {
        MemberPhase::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberCondition {
    Ready,
    Terminated,
    AutoUpgrade,
}

/// A set over the three condition types a member can carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConditions(pub BTreeSet<MemberCondition>);

impl MemberConditions {
    pub fn is_true(&self, cond: MemberCondition) -> bool {
        self.0.contains(&cond)
    }

    pub fn set(&mut self, cond: MemberCondition) {
        self.0.insert(cond);
    }

    pub fn remove(&mut self, cond: MemberCondition) {
        self.0.remove(&cond);
    }
}

/// One member (one pod-worth of arangod/arangosync) within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStatus {
    /// Stable random identity; unique within its group.
    pub id: String,
    #[serde(default)]
    pub pod_name: String,
    #[serde(default)]
    pub persistent_volume_claim_name: String,
    #[serde(default)]
    pub phase: MemberPhase,
    #[serde(default)]
    pub is_initialized: bool,
    #[serde(default)]
    pub conditions: MemberConditions,
}

impl MemberStatus {
    pub fn new(id: String) -> Self {
        Self {
            id,
            pod_name: String::new(),
            persistent_volume_claim_name: String::new(),
            phase: MemberPhase::None,
            is_initialized: false,
            conditions: MemberConditions::default(),
        }
    }
}

/// An ordered list of members for one group, with convenience lookups by ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberList(pub Vec<MemberStatus>);

impl MemberList {
    pub fn get(&self, id: &str) -> Option<&MemberStatus> {
        self.0.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut MemberStatus> {
        self.0.iter_mut().find(|m| m.id == id)
    }

    pub fn update(&mut self, member: MemberStatus) {
        if let Some(slot) = self.0.iter_mut().find(|m| m.id == member.id) {
            *slot = member;
        } else {
            self.0.push(member);
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.0.retain(|m| m.id != id);
    }

    /// All IDs present are unique within the group (§3 invariant).
    pub fn has_unique_ids(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.0.iter().all(|m| seen.insert(m.id.clone()))
    }
}

/// Per-group member lists, keyed by `ServerGroup`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStatusList {
    #[serde(default)]
    pub single: MemberList,
    #[serde(default)]
    pub agents: MemberList,
    #[serde(default)]
    pub db_servers: MemberList,
    #[serde(default)]
    pub coordinators: MemberList,
    #[serde(default)]
    pub sync_masters: MemberList,
    #[serde(default)]
    pub sync_workers: MemberList,
}

impl MemberStatusList {
    pub fn group(&self, group: ServerGroup) -> &MemberList {
        match group {
            ServerGroup::Single => &self.single,
            ServerGroup::Agents => &self.agents,
            ServerGroup::DBServers => &self.db_servers,
            ServerGroup::Coordinators => &self.coordinators,
            ServerGroup::SyncMasters => &self.sync_masters,
            ServerGroup::SyncWorkers => &self.sync_workers,
        }
    }

    pub fn group_mut(&mut self, group: ServerGroup) -> &mut MemberList {
        match group {
            ServerGroup::Single => &mut self.single,
            ServerGroup::Agents => &mut self.agents,
            ServerGroup::DBServers => &mut self.db_servers,
            ServerGroup::Coordinators => &mut self.coordinators,
            ServerGroup::SyncMasters => &mut self.sync_masters,
            ServerGroup::SyncWorkers => &mut self.sync_workers,
        }
    }

    pub fn for_each_group<F>(&self, mut f: F)
    where
        F: FnMut(ServerGroup, &MemberList),
    {
        for group in ServerGroup::ALL {
            f(group, self.group(group));
        }
    }

    /// Flattened count of members per group, used by scaling-related status
    /// reporting.
    pub fn counts(&self) -> BTreeMap<ServerGroup, usize> {
        let mut out = BTreeMap::new();
        for group in ServerGroup::ALL {
            out.insert(group, self.group(group).0.len());
        }
        out
    }
}

//! Detects member-level failure and marks members for replacement (§4.6).
//!
//! Mirrors the shape of a threshold-based failure detector: track how long
//! a member has stayed unready or terminated, and once that exceeds a
//! policy threshold, flip its phase to `Failed` so the reconciler picks it
//! up for replacement.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::domain::models::{MemberCondition, MemberPhase, MemberStatus};

/// How long a member may stay unready or terminated before resilience
/// marks it `Failed`.
#[derive(Debug, Clone, Copy)]
pub struct ResilienceConfig {
    pub unready_threshold: Duration,
    pub terminated_threshold: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            unready_threshold: Duration::from_secs(5 * 60),
            terminated_threshold: Duration::from_secs(60),
        }
    }
}

/// Tracks, per member ID, the instant its current unhealthy streak started.
/// A member that recovers (becomes Ready, or its Terminated condition
/// clears) is removed from the map.
#[derive(Debug, Default)]
pub struct Resilience {
    config: ResilienceConfig,
    unhealthy_since: HashMap<String, Instant>,
}

impl Resilience {
    pub fn new(config: ResilienceConfig) -> Self {
        Self {
            config,
            unhealthy_since: HashMap::new(),
        }
    }

    /// Inspects one member and returns `true` if it should transition to
    /// `Failed`. Updates internal bookkeeping as a side effect; call once
    /// per member per inspection tick.
    pub fn inspect(&mut self, member: &MemberStatus, now: Instant) -> bool {
        if member.phase == MemberPhase::Failed {
            self.unhealthy_since.remove(&member.id);
            return false;
        }

        let terminated = member.conditions.is_true(MemberCondition::Terminated);
        let ready = member.conditions.is_true(MemberCondition::Ready);

        if terminated || !ready {
            let since = *self.unhealthy_since.entry(member.id.clone()).or_insert(now);
            let elapsed = now.duration_since(since);
            let threshold = if terminated {
                self.config.terminated_threshold
            } else {
                self.config.unready_threshold
            };
            if elapsed >= threshold {
                warn!(member = %member.id, elapsed_secs = elapsed.as_secs(), "member exceeded health threshold, marking failed");
                return true;
            }
        } else {
            self.unhealthy_since.remove(&member.id);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::MemberConditions;
    use std::collections::BTreeSet;

    fn member_with(conditions: &[MemberCondition]) -> MemberStatus {
        let mut m = MemberStatus::new("m1".to_string());
        m.conditions = MemberConditions(conditions.iter().copied().collect::<BTreeSet<_>>());
        m
    }

    #[test]
    fn ready_member_is_never_failed() {
        let mut resilience = Resilience::new(ResilienceConfig {
            unready_threshold: Duration::from_secs(1),
            terminated_threshold: Duration::from_secs(1),
        });
        let member = member_with(&[MemberCondition::Ready]);
        let now = Instant::now();
        assert!(!resilience.inspect(&member, now));
        assert!(!resilience.inspect(&member, now + Duration::from_secs(10)));
    }

    #[test]
    fn unready_member_fails_after_threshold() {
        let mut resilience = Resilience::new(ResilienceConfig {
            unready_threshold: Duration::from_secs(5),
            terminated_threshold: Duration::from_secs(5),
        });
        let member = member_with(&[]);
        let t0 = Instant::now();
        assert!(!resilience.inspect(&member, t0));
        assert!(!resilience.inspect(&member, t0 + Duration::from_secs(4)));
        assert!(resilience.inspect(&member, t0 + Duration::from_secs(6)));
    }

    #[test]
    fn recovering_member_resets_the_clock() {
        let mut resilience = Resilience::new(ResilienceConfig {
            unready_threshold: Duration::from_secs(5),
            terminated_threshold: Duration::from_secs(5),
        });
        let unready = member_with(&[]);
        let ready = member_with(&[MemberCondition::Ready]);
        let t0 = Instant::now();
        assert!(!resilience.inspect(&unready, t0));
        assert!(!resilience.inspect(&ready, t0 + Duration::from_secs(4)));
        assert!(!resilience.inspect(&unready, t0 + Duration::from_secs(6)));
    }
}

//! An edge-coalescing wakeup signal: arbitrarily many `fire()` calls between
//! two `wait()`s coalesce into a single wakeup. Used by the deployment
//! manager's run loop (§4.1) to debounce the inspect/update triggers — a
//! burst of spec-update notifications should wake the loop once, not once
//! per notification.

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct Trigger {
    notify: Notify,
}

impl Trigger {
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
        }
    }

    /// Arms the trigger. Safe to call from any number of concurrent
    /// producers; redundant calls before the next `wait()` have no
    /// additional effect (one-slot semantics).
    pub fn fire(&self) {
        self.notify.notify_one();
    }

    /// Resolves once `fire()` has been called at least once since the
    /// previous `wait()` returned (or since construction).
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn multiple_fires_coalesce_into_one_wakeup() {
        let trigger = Arc::new(Trigger::new());
        trigger.fire();
        trigger.fire();
        trigger.fire();

        tokio::time::timeout(Duration::from_millis(50), trigger.wait())
            .await
            .expect("first wait resolves immediately");

        let woke = tokio::time::timeout(Duration::from_millis(20), trigger.wait()).await;
        assert!(woke.is_err(), "second wait should not resolve without a new fire");
    }

    #[tokio::test]
    async fn fire_after_wait_arms_again() {
        let trigger = Trigger::new();
        trigger.fire();
        trigger.wait().await;
        trigger.fire();
        tokio::time::timeout(Duration::from_millis(50), trigger.wait())
            .await
            .expect("re-armed trigger resolves");
    }
}

//! Operator-level configuration, mirroring the teacher's `domain::models::config::Config`
//! shape: the plain-data config object that `ConfigLoader` merges from
//! defaults / file / environment, independent of how it is loaded.

use serde::{Deserialize, Serialize};

/// Corresponds to the original's `Config{ServiceAccount, AllowChaos}` plus
/// the ambient tunables the operator needs that the distillation left
/// implicit (reconciliation cadence, event channel sizing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Service account pods are created under.
    pub service_account: String,
    /// Enables the chaos monkey collaborator (§2, §4 — test environments only).
    pub allow_chaos: bool,
    /// Capacity of the per-deployment event channel (§4.1, fixed at 256 by spec,
    /// but kept configurable for tests that want to exercise backpressure at
    /// smaller scale).
    pub event_channel_capacity: usize,
    /// Floor of the inspection interval, in milliseconds, after an explicit trigger.
    pub min_inspection_interval_ms: u64,
    /// Ceiling of the inspection interval, in milliseconds.
    pub max_inspection_interval_ms: u64,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_account: "default".to_string(),
            allow_chaos: false,
            event_channel_capacity: 256,
            min_inspection_interval_ms: 1_000,
            max_inspection_interval_ms: 60_000,
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Pretty
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

//! Hierarchical configuration loading (§4.8), grounded on the teacher's
//! `ConfigLoader`: programmatic defaults, an optional config file, then
//! environment variables, highest-precedence last.

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{Config, LogFormat};

const ENV_PREFIX: &str = "OPERATOR_";
const CONFIG_FILE: &str = "operator.yaml";
const LOCAL_CONFIG_FILE: &str = "operator.local.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("service_account must not be empty")]
    EmptyServiceAccount,

    #[error("invalid log level: {0}. must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("event_channel_capacity must be at least 1")]
    InvalidEventChannelCapacity,

    #[error("min_inspection_interval_ms ({0}) must be less than max_inspection_interval_ms ({1})")]
    InvalidInspectionIntervalBounds(u64, u64),

    #[error("failed to load configuration: {0}")]
    Figment(#[from] figment::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `Config` from programmatic defaults, `operator.yaml` /
    /// `operator.local.yaml` if present, then `OPERATOR_`-prefixed
    /// environment variables.
    pub fn load() -> Result<Config, ConfigError> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config, ConfigError> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.service_account.trim().is_empty() {
            return Err(ConfigError::EmptyServiceAccount);
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.log.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.log.level.clone()));
        }

        if config.event_channel_capacity == 0 {
            return Err(ConfigError::InvalidEventChannelCapacity);
        }

        if config.min_inspection_interval_ms >= config.max_inspection_interval_ms {
            return Err(ConfigError::InvalidInspectionIntervalBounds(
                config.min_inspection_interval_ms,
                config.max_inspection_interval_ms,
            ));
        }

        let _ = LogFormat::Pretty; // format itself is an enum, nothing further to validate

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        ConfigLoader::validate(&Config::default()).unwrap();
    }

    #[test]
    fn empty_service_account_is_rejected() {
        let mut config = Config::default();
        config.service_account = String::new();
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyServiceAccount));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut config = Config::default();
        config.log.level = "verbose".to_string();
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
    }

    #[test]
    fn inverted_inspection_bounds_are_rejected() {
        let mut config = Config::default();
        config.min_inspection_interval_ms = 60_000;
        config.max_inspection_interval_ms = 1_000;
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInspectionIntervalBounds(_, _)));
    }

    #[test]
    fn load_from_nonexistent_file_falls_back_to_defaults() {
        let config = ConfigLoader::load_from_file("does-not-exist.yaml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn env_override_takes_precedence_over_defaults() {
        temp_env::with_var("OPERATOR_SERVICE_ACCOUNT", Some("custom-sa"), || {
            let config = ConfigLoader::load_from_file("does-not-exist.yaml").unwrap();
            assert_eq!(config.service_account, "custom-sa");
        });
    }
}

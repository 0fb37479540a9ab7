//! Hierarchical configuration loading (§4.8).

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};

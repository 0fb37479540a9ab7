//! Ambient stack: configuration loading and structured logging (§4.8, §4.9).

pub mod config;
pub mod logging;

//! Structured logging initialization (§4.9).

pub mod logger;

pub use logger::{LoggerError, LoggerImpl};

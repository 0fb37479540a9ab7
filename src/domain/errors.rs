//! Operator-level errors, classified by effect (§7) rather than by cause —
//! the same shape as the teacher's `DomainError`: one `thiserror` enum,
//! `From` impls bridging lower-level errors into the right variant.

use thiserror::Error;

/// Effect-classified error kind, used for control flow by callers (retry on
/// `Conflict`, treat `NotFound`/`AlreadyExists` as success in the right
/// contexts, restore-and-continue on `Validation`).
#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("optimistic concurrency conflict on {resource}")]
    Conflict { resource: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    #[error("transient remote failure: {0}")]
    Transient(String),

    #[error("fatal: {0}")]
    Fatal(String),
}

pub type OperatorResult<T> = Result<T, OperatorError>;

impl OperatorError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, OperatorError::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, OperatorError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, OperatorError::AlreadyExists { .. })
    }
}

impl From<serde_json::Error> for OperatorError {
    fn from(err: serde_json::Error) -> Self {
        OperatorError::Fatal(format!("serialization error: {err}"))
    }
}

impl From<reqwest::Error> for OperatorError {
    fn from(err: reqwest::Error) -> Self {
        OperatorError::Transient(err.to_string())
    }
}

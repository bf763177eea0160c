use std::path::PathBuf;

use thiserror::Error;

/// The error taxonomy from spec.md §7, realized as variants on the
/// core crate's error type. `CacheInconsistency` is recoverable by the
/// caller (recompute and re-store); everything else is a terminal
/// failure for the single file/pair in question.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid input at {path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("distance precondition violated: {0}")]
    DistancePrecondition(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("cached result's config does not match the current config for key {0}")]
    CacheInconsistency(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

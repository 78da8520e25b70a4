//! Error taxonomy for the coordination kernel.
//!
//! Every error that can cross the kernel boundary is a variant of [`TdError`].
//! `code()` maps each variant onto the wire-level error codes from the
//! external-interfaces contract so the CLI (and any future collaborator) can
//! render `{"error": {"code": ..., "message": ...}}` without re-deriving the
//! mapping itself.

use std::path::PathBuf;
use thiserror::Error;

pub type TdResult<T> = Result<T, TdError>;

#[derive(Error, Debug)]
pub enum TdError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("cannot approve your own implementation")]
    CannotSelfApprove,

    #[error("handoff required before this transition")]
    HandoffRequired,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("write lock busy: could not acquire {path} within {timeout_ms}ms")]
    Busy { path: PathBuf, timeout_ms: u64 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl TdError {
    /// The stable wire code used in JSON output and CLI error mapping.
    pub fn code(&self) -> &'static str {
        match self {
            TdError::NotFound(_) => "not_found",
            TdError::InvalidInput(_) => "invalid_input",
            TdError::Conflict(_) => "conflict",
            TdError::CannotSelfApprove => "cannot_self_approve",
            TdError::HandoffRequired => "handoff_required",
            TdError::Database(_) | TdError::Io { .. } | TdError::Json(_) | TdError::Toml(_) => {
                "database_error"
            }
            TdError::Busy { .. } => "busy",
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TdError::Io {
            path: path.into(),
            source,
        }
    }
}

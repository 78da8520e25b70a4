//! Command-layer error types, distinct from [`td_core::error::TdError`]:
//! these cover argument parsing failures that never reach the kernel.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown issue type '{0}' (expected bug, feature, task, epic, or chore)")]
    UnknownIssueType(String),

    #[error("unknown priority '{0}' (expected P0-P4 or critical/high/medium/low/trivial)")]
    UnknownPriority(String),

    #[error("unknown log tag '{0}' (expected progress, blocker, decision, hypothesis, tried, or result)")]
    UnknownLogTag(String),

    #[error("story points must be one of {0:?}")]
    InvalidStoryPoints(&'static [i64]),
}

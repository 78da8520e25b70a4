//! Domain data model.
//!
//! Typed structs with explicit serde configuration for every entity the
//! store persists: issues and their satellites (logs, handoffs, comments,
//! git snapshots, files, boards, notes, work sessions).

mod issue;
mod satellites;

pub use issue::{Issue, IssuePriority, IssueStatus, IssueType, VALID_STORY_POINTS};
pub use satellites::{
    Board, BoardPosition, Comment, GitSnapshot, Handoff, IssueFile, Log, LogTag, Note, WorkSession,
};

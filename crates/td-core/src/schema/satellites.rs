//! Satellite entities owned by an issue (or standalone).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTag {
    Progress,
    Blocker,
    Decision,
    Hypothesis,
    Tried,
    Result,
}

impl Default for LogTag {
    fn default() -> Self {
        LogTag::Progress
    }
}

impl LogTag {
    pub fn as_str(self) -> &'static str {
        match self {
            LogTag::Progress => "progress",
            LogTag::Blocker => "blocker",
            LogTag::Decision => "decision",
            LogTag::Hypothesis => "hypothesis",
            LogTag::Tried => "tried",
            LogTag::Result => "result",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "progress" => Some(LogTag::Progress),
            "blocker" => Some(LogTag::Blocker),
            "decision" => Some(LogTag::Decision),
            "hypothesis" => Some(LogTag::Hypothesis),
            "tried" => Some(LogTag::Tried),
            "result" => Some(LogTag::Result),
            _ => None,
        }
    }
}

/// An append-only progress note attached to an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    pub id: String,
    pub issue_id: String,
    pub session_id: String,
    pub tag: LogTag,
    pub message: String,
    pub created_at: String,
}

/// A versioned structured snapshot of work state transferred between
/// sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Handoff {
    pub id: String,
    pub issue_id: String,
    pub session_id: String,
    pub version: i64,
    pub done: String,
    pub remaining: String,
    pub decisions: String,
    pub uncertain: String,
    #[serde(default)]
    pub files: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub issue_id: String,
    pub session_id: String,
    pub body: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitSnapshot {
    pub id: String,
    pub issue_id: String,
    pub branch: String,
    pub commit: String,
    pub dirty: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueFile {
    pub id: String,
    pub issue_id: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
}

/// A standalone work session spanning possibly many issues
/// (`work_session_issues` is the join table in the store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkSession {
    pub id: String,
    pub session_id: String,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub issue_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardPosition {
    pub board_id: String,
    pub issue_id: String,
    pub column: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

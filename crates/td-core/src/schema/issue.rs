//! The `Issue` entity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status lifecycle enforced by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Blocked,
    InReview,
    Closed,
}

impl IssueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Blocked => "blocked",
            IssueStatus::InReview => "in_review",
            IssueStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(IssueStatus::Open),
            "in_progress" => Some(IssueStatus::InProgress),
            "blocked" => Some(IssueStatus::Blocked),
            "in_review" => Some(IssueStatus::InReview),
            "closed" => Some(IssueStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Bug,
    Feature,
    Task,
    Epic,
    Chore,
}

impl Default for IssueType {
    fn default() -> Self {
        IssueType::Task
    }
}

impl IssueType {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::Bug => "bug",
            IssueType::Feature => "feature",
            IssueType::Task => "task",
            IssueType::Epic => "epic",
            IssueType::Chore => "chore",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bug" => Some(IssueType::Bug),
            "feature" => Some(IssueType::Feature),
            "task" => Some(IssueType::Task),
            "epic" => Some(IssueType::Epic),
            "chore" => Some(IssueType::Chore),
            _ => None,
        }
    }
}

/// `P0` (most urgent) through `P4` (least urgent), with a word-form
/// normalization table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssuePriority {
    P0,
    P1,
    P2,
    P3,
    P4,
}

impl IssuePriority {
    pub fn as_str(self) -> &'static str {
        match self {
            IssuePriority::P0 => "P0",
            IssuePriority::P1 => "P1",
            IssuePriority::P2 => "P2",
            IssuePriority::P3 => "P3",
            IssuePriority::P4 => "P4",
        }
    }

    /// Accepts `P0`..`P4` case-insensitively or the documented word forms
    /// (`critical`, `high`, `medium`, `low`, `trivial`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "p0" | "critical" | "urgent" => Some(IssuePriority::P0),
            "p1" | "high" => Some(IssuePriority::P1),
            "p2" | "medium" | "normal" => Some(IssuePriority::P2),
            "p3" | "low" => Some(IssuePriority::P3),
            "p4" | "trivial" => Some(IssuePriority::P4),
            _ => None,
        }
    }
}

/// Story points are restricted to the documented Fibonacci-like set.
pub const VALID_STORY_POINTS: &[i64] = &[1, 2, 3, 5, 8, 13, 21];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<i64>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub acceptance: String,
    pub creator_session: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementer_session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_session: Option<String>,
    #[serde(default)]
    pub minor: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,

    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl Issue {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_word_forms() {
        assert_eq!(IssuePriority::parse("critical"), Some(IssuePriority::P0));
        assert_eq!(IssuePriority::parse("high"), Some(IssuePriority::P1));
        assert_eq!(IssuePriority::parse("p3"), Some(IssuePriority::P3));
        assert_eq!(IssuePriority::parse("P2"), Some(IssuePriority::P2));
        assert_eq!(IssuePriority::parse("nonsense"), None);
    }

    #[test]
    fn priority_ordinal_is_urgent_first() {
        assert!(IssuePriority::P0 < IssuePriority::P1);
        assert!(IssuePriority::P1 < IssuePriority::P4);
    }

    #[test]
    fn status_round_trips_through_snake_case() {
        let json = serde_json::to_string(&IssueStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: IssueStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, IssueStatus::InProgress);
    }

    #[test]
    fn issue_round_trips_preserving_unknown_fields() {
        let raw = serde_json::json!({
                "id": "td-abc123",
                "title": "fix thing",
                "description": "",
                "type": "bug",
                "status": "open",
                "priority": "P2",
                "labels": [],
                "acceptance": "",
                "creator_session": "ses_aaaaaaaa",
                "minor": false,
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z",
                "future_field": "kept"
        });
        let issue: Issue = serde_json::from_value(raw).unwrap();
        assert_eq!(issue.unknown_fields.get("future_field").unwrap(), "kept");
        let back = serde_json::to_value(&issue).unwrap();
        assert_eq!(back["future_field"], "kept");
    }
}

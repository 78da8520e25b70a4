//! Security event audit log (`security_events.jsonl`).
//!
//! A flat, append-only, one-JSON-object-per-line file recording every
//! `self_close_exception` bypass. Unlike a general-purpose
//! size-rotated event log (rotation, schema header line, configurable
//! verbosity) this file has one fixed schema and no rotation: the four
//! fields are exact and nothing else, so no ambient rotation/verbosity
//! behavior is invented on top of it. Writes are fail-open in the sense that
//! a failure here never blocks the mutation it accompanies from returning,
//! but errors are still surfaced, rather than silently swallowed, since
//! this file is itself an audit requirement,
//! not a diagnostic nicety.

use crate::error::{TdError, TdResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub ts: String,
    pub issue_id: String,
    pub session_id: String,
    pub agent_type: String,
    pub reason: String,
}

impl SecurityEvent {
    pub fn new(issue_id: &str, session_id: &str, agent_type: &str, reason: &str) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            issue_id: issue_id.to_string(),
            session_id: session_id.to_string(),
            agent_type: agent_type.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Append a security event to `<store-root>/.todos/security_events.jsonl`.
pub fn record(security_log_path: &Path, event: &SecurityEvent) -> TdResult<()> {
    if let Some(parent) = security_log_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| TdError::io(parent, e))?;
    }
    let line = serde_json::to_string(event)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(security_log_path)
        .map_err(|e| TdError::io(security_log_path, e))?;
    file.write_all(line.as_bytes())
        .map_err(|e| TdError::io(security_log_path, e))?;
    file.write_all(b"\n")
        .map_err(|e| TdError::io(security_log_path, e))?;
    file.flush().map_err(|e| TdError::io(security_log_path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn records_append_as_jsonl() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("security_events.jsonl");
        record(
            &path,
            &SecurityEvent::new("td-abc123", "ses_deadbeef", "claude-code", "urgent hotfix"),
        )
        .unwrap();
        record(
            &path,
            &SecurityEvent::new("td-abc123", "ses_deadbeef", "claude-code", "second bypass"),
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: SecurityEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.issue_id, "td-abc123");
        assert_eq!(first.reason, "urgent hotfix");
    }
}

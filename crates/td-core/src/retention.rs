//! Session record pruning.
//!
//! Records older than a configurable idle threshold may be pruned.
//! Duration-string parsing and age comparison against `last_activity`,
//! retargeted from inbox
//! message retention onto on-disk session records.

use crate::session::SessionRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneResult {
    pub kept: usize,
    pub pruned: usize,
}

/// Parse a duration string like `"7d"` or `"24h"` into a `chrono::Duration`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("empty duration string");
    }
    let (num_part, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => anyhow::bail!("duration must have a unit (h or d): {s}"),
    };
    let num: i64 = num_part
        .parse()
        .with_context(|| format!("invalid number in duration: {s}"))?;
    match unit {
        "h" => Ok(Duration::hours(num)),
        "d" => Ok(Duration::days(num)),
        _ => anyhow::bail!("unknown duration unit '{unit}'; use 'h' or 'd'"),
    }
}

fn is_idle(record: &SessionRecord, max_idle: Duration, now: DateTime<Utc>) -> bool {
    match DateTime::parse_from_rfc3339(&record.last_activity) {
        Ok(t) => now.signed_duration_since(t.with_timezone(&Utc)) > max_idle,
        Err(_) => true,
    }
}

/// Walk `<store-root>/.todos/sessions/` and remove session files whose
/// `last_activity` is older than `max_idle`. Sessions pointed to as a
/// `previous_session_id` by a still-live session are pruned independently —
/// the chain is audit history, not a liveness dependency.
pub fn prune_sessions(sessions_root: &Path, max_idle: Duration) -> Result<PruneResult> {
    if !sessions_root.exists() {
        return Ok(PruneResult { kept: 0, pruned: 0 });
    }
    let now = Utc::now();
    let mut kept = 0;
    let mut pruned = 0;

    for branch_entry in fs::read_dir(sessions_root)? {
        let branch_entry = branch_entry?;
        if !branch_entry.file_type()?.is_dir() {
            continue;
        }
        for file_entry in fs::read_dir(branch_entry.path())? {
            let file_entry = file_entry?;
            let path = file_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(_) => continue,
            };
            let record: SessionRecord = match serde_json::from_str(&content) {
                Ok(r) => r,
                Err(_) => continue,
            };
            if is_idle(&record, max_idle, now) {
                fs::remove_file(&path)?;
                pruned += 1;
            } else {
                kept += 1;
            }
        }
    }

    Ok(PruneResult { kept, pruned })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours_and_days() {
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
    }

    #[test]
    fn rejects_missing_unit() {
        assert!(parse_duration("24").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn empty_sessions_root_is_a_noop() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = prune_sessions(&dir.path().join("sessions"), Duration::days(30)).unwrap();
        assert_eq!(result, PruneResult { kept: 0, pruned: 0 });
    }
}

//! Involvement ledger: per-issue, per-session action record.
//!
//! Append-only, unconditional. Recording `unstarted` does *not* remove the
//! earlier `started` entry — this is the central bypass-prevention invariant:
//! a session cannot erase its trace by abandoning work.

use crate::error::TdResult;
use crate::id::{normalize, IdKind};
use crate::store::Store;
use rusqlite::params;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvolvementAction {
    Created,
    Started,
    Unstarted,
    Reviewed,
}

impl InvolvementAction {
    pub fn as_str(self) -> &'static str {
        match self {
            InvolvementAction::Created => "created",
            InvolvementAction::Started => "started",
            InvolvementAction::Unstarted => "unstarted",
            InvolvementAction::Reviewed => "reviewed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvolvementEntry {
    pub issue_id: String,
    pub session_id: String,
    pub action: String,
    pub timestamp: String,
}

/// Append, unconditional, ID-normalizing.
pub fn record(
    store: &Store,
    issue_id: &str,
    session_id: &str,
    action: InvolvementAction,
    timestamp: &str,
) -> TdResult<()> {
    let issue_id = normalize(IdKind::Issue, issue_id)?;
    store.conn().execute(
        "INSERT INTO involvement (issue_id, session_id, action, timestamp) VALUES (?1,?2,?3,?4)",
        params![issue_id, session_id, action.as_str(), timestamp],
    )?;
    Ok(())
}

/// True iff at least one entry exists for the pair.
pub fn was_involved(store: &Store, issue_id: &str, session_id: &str) -> TdResult<bool> {
    let count: i64 = store.conn().query_row(
        "SELECT COUNT(*) FROM involvement WHERE issue_id = ?1 AND session_id = ?2",
        params![issue_id, session_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Chronological history for one issue.
pub fn history(store: &Store, issue_id: &str) -> TdResult<Vec<InvolvementEntry>> {
    let mut stmt = store.conn().prepare(
        "SELECT issue_id, session_id, action, timestamp FROM involvement
        WHERE issue_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![issue_id], |row| {
            Ok(InvolvementEntry {
                    issue_id: row.get(0)?,
                    session_id: row.get(1)?,
                    action: row.get(2)?,
                    timestamp: row.get(3)?,
            })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[test]
    fn not_involved_until_first_entry() {
        let store = Store::open_in_memory().unwrap();
        assert!(!was_involved(&store, "td-abc123", "ses_aaaaaaaa").unwrap());
        record(
            &store,
            "td-abc123",
            "ses_aaaaaaaa",
            InvolvementAction::Started,
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
        assert!(was_involved(&store, "td-abc123", "ses_aaaaaaaa").unwrap());
    }

    #[test]
    fn unstart_does_not_launder_involvement() {
        let store = Store::open_in_memory().unwrap();
        record(
            &store,
            "td-abc123",
            "ses_aaaaaaaa",
            InvolvementAction::Started,
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
        record(
            &store,
            "td-abc123",
            "ses_aaaaaaaa",
            InvolvementAction::Unstarted,
            "2026-01-01T00:01:00Z",
        )
        .unwrap();

        // Monotonicity: was_involved stays true even though the only
        // "current" state is unstarted.
        assert!(was_involved(&store, "td-abc123", "ses_aaaaaaaa").unwrap());
        assert_eq!(history(&store, "td-abc123").unwrap().len(), 2);
    }

    #[test]
    fn involvement_is_scoped_per_session() {
        let store = Store::open_in_memory().unwrap();
        record(
            &store,
            "td-abc123",
            "ses_aaaaaaaa",
            InvolvementAction::Started,
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
        assert!(!was_involved(&store, "td-abc123", "ses_bbbbbbbb").unwrap());
    }
}

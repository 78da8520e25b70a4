//! Action log: append-only entity-change record for undo/audit/sync.

use crate::error::TdResult;
use crate::id::{generate, IdKind};
use crate::store::Store;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: String,
    pub session_id: String,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub previous_data: Option<String>,
    pub new_data: Option<String>,
    pub timestamp: String,
    pub undone: bool,
    pub synced_at: Option<String>,
}

/// Append one entry. Called by every logged mutator under the same
/// write-lock hold as the mutation it records.
pub fn append(
    store: &Store,
    session_id: &str,
    action_type: &str,
    entity_type: &str,
    entity_id: &str,
    previous_data: Option<&str>,
    new_data: Option<&str>,
    timestamp: &str,
) -> TdResult<ActionLogEntry> {
    let id = generate(IdKind::ActionLog);
    store.conn().execute(
        "INSERT INTO action_log (external_id, session_id, action_type, entity_type, entity_id,
        previous_data, new_data, timestamp, undone, synced_at)
    VALUES (?1,?2,?3,?4,?5,?6,?7,?8,0,NULL)",
        params![
            id,
            session_id,
            action_type,
            entity_type,
            entity_id,
            previous_data,
            new_data,
            timestamp
        ],
    )?;
    Ok(ActionLogEntry {
            id,
            session_id: session_id.to_string(),
            action_type: action_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            previous_data: previous_data.map(str::to_string),
            new_data: new_data.map(str::to_string),
            timestamp: timestamp.to_string(),
            undone: false,
            synced_at: None,
    })
}

/// History for one entity, most-recent-first — the order `undo` walks.
pub fn history_for_entity(
    store: &Store,
    entity_type: &str,
    entity_id: &str,
) -> TdResult<Vec<ActionLogEntry>> {
    let mut stmt = store.conn().prepare(
        "SELECT external_id, session_id, action_type, entity_type, entity_id,
        previous_data, new_data, timestamp, undone, synced_at
        FROM action_log WHERE entity_type = ?1 AND entity_id = ?2
        ORDER BY id DESC",
    )?;
    let rows = stmt.query_map(params![entity_type, entity_id], row_to_entry)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Entries with `synced_at IS NULL AND undone = 0` form the pending sync
/// set. The sync transport itself is out of scope; this is the read
/// surface a future transport would poll.
pub fn pending_sync(store: &Store) -> TdResult<Vec<ActionLogEntry>> {
    let mut stmt = store.conn().prepare(
        "SELECT external_id, session_id, action_type, entity_type, entity_id,
        previous_data, new_data, timestamp, undone, synced_at
        FROM action_log WHERE synced_at IS NULL AND undone = 0
        ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], row_to_entry)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Mark an entry's `synced_at`. The only mutation action-log rows ever
/// receive besides `undone`.
pub fn mark_synced(store: &Store, external_id: &str, synced_at: &str) -> TdResult<()> {
    store.conn().execute(
        "UPDATE action_log SET synced_at = ?2 WHERE external_id = ?1",
        params![external_id, synced_at],
    )?;
    Ok(())
}

/// Mark the most recent non-undone entry for `entity_id` as undone,
/// returning it so the caller can apply the inverse to the entity.
pub fn mark_most_recent_undone(
    store: &Store,
    entity_type: &str,
    entity_id: &str,
) -> TdResult<Option<ActionLogEntry>> {
    let entry = store
    .conn()
    .query_row(
        "SELECT external_id, session_id, action_type, entity_type, entity_id,
        previous_data, new_data, timestamp, undone, synced_at
        FROM action_log
        WHERE entity_type = ?1 AND entity_id = ?2 AND undone = 0
        ORDER BY id DESC LIMIT 1",
        params![entity_type, entity_id],
        row_to_entry,
    )
    .optional()?;

    if let Some(ref e) = entry {
        store.conn().execute(
            "UPDATE action_log SET undone = 1 WHERE external_id = ?1",
            params![e.id],
        )?;
    }
    Ok(entry)
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<ActionLogEntry> {
    Ok(ActionLogEntry {
            id: row.get(0)?,
            session_id: row.get(1)?,
            action_type: row.get(2)?,
            entity_type: row.get(3)?,
            entity_id: row.get(4)?,
            previous_data: row.get(5)?,
            new_data: row.get(6)?,
            timestamp: row.get(7)?,
            undone: row.get::<_, i64>(8)? != 0,
            synced_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[test]
    fn append_and_read_history() {
        let store = Store::open_in_memory().unwrap();
        append(
            &store,
            "ses_aaaaaaaa",
            "create",
            "issue",
            "td-abc123",
            None,
            Some("{}"),
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
        append(
            &store,
            "ses_aaaaaaaa",
            "update",
            "issue",
            "td-abc123",
            Some("{}"),
            Some("{\"title\":\"x\"}"),
            "2026-01-01T00:01:00Z",
        )
        .unwrap();

        let history = history_for_entity(&store, "issue", "td-abc123").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action_type, "update");
    }

    #[test]
    fn pending_sync_excludes_synced_and_undone() {
        let store = Store::open_in_memory().unwrap();
        let entry = append(
            &store,
            "ses_aaaaaaaa",
            "create",
            "issue",
            "td-abc123",
            None,
            Some("{}"),
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
        assert_eq!(pending_sync(&store).unwrap().len(), 1);

        mark_synced(&store, &entry.id, "2026-01-01T00:05:00Z").unwrap();
        assert_eq!(pending_sync(&store).unwrap().len(), 0);
    }

    #[test]
    fn undo_marks_most_recent_entry() {
        let store = Store::open_in_memory().unwrap();
        append(
            &store,
            "ses_aaaaaaaa",
            "create",
            "issue",
            "td-abc123",
            None,
            Some("{}"),
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
        let undone = mark_most_recent_undone(&store, "issue", "td-abc123")
        .unwrap()
        .unwrap();
        assert_eq!(undone.action_type, "create");
        assert!(
            mark_most_recent_undone(&store, "issue", "td-abc123")
            .unwrap()
            .is_none()
        );
    }
}

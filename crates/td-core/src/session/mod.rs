//! Session identity.
//!
//! One record per (git-branch, agent-fingerprint) pair, persisted at
//! `<store-root>/.todos/sessions/<sanitized-branch>/<fingerprint>.json`.
//! Legacy single-file layouts (`.todos/session`, `.todos/sessions/<branch>.json`)
//! are migrated on read: parsed, re-serialized into the nested layout, and
//! removed.

pub mod fingerprint;

use crate::error::{TdError, TdResult};
use crate::id::{generate, IdKind};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub branch: String,
    pub agent_type: String,
    pub parent_pid: u32,
    /// Audit-only; never used for scoping.
    pub original_context_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_session_id: Option<String>,
    pub started_at: String,
    pub last_activity: String,
}

/// Replace characters that are unsafe in a path segment with `_`
/// (`/ \ : * ? " < > |`).
pub fn sanitize_branch(branch: &str) -> String {
    branch
    .chars()
    .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
    })
    .collect()
}

fn sessions_dir(store_root: &Path, branch: &str) -> PathBuf {
    store_root
    .join(".todos/sessions")
    .join(sanitize_branch(branch))
}

fn session_path(store_root: &Path, branch: &str, fp: &str) -> PathBuf {
    sessions_dir(store_root, branch).join(format!("{fp}.json"))
}

fn legacy_single_session_path(store_root: &Path) -> PathBuf {
    store_root.join(".todos/session")
}

fn legacy_branch_session_path(store_root: &Path, branch: &str) -> PathBuf {
    store_root
    .join(".todos/sessions")
    .join(format!("{}.json", sanitize_branch(branch)))
}

/// Tracks the session last resolved by *any* (branch, fingerprint) pair in
/// this store, independent of path. Consulted when a dimension change routes
/// to a session path that has never been written: the new record's
/// `previous_session_id` chains back to whatever this pointer names, rather
/// than `None`, per §3 ("a new record is created — linked via
/// `previous_session_id` — when either dimension changes").
fn current_pointer_path(store_root: &Path) -> PathBuf {
    store_root.join(".todos/sessions/.current.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CurrentPointer {
    session_id: String,
}

fn read_current_session_id(store_root: &Path) -> Option<String> {
    let path = current_pointer_path(store_root);
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str::<CurrentPointer>(&content)
    .ok()
    .map(|p| p.session_id)
}

fn write_current_session_id(store_root: &Path, session_id: &str) -> TdResult<()> {
    let path = current_pointer_path(store_root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TdError::io(parent, e))?;
    }
    let json = serde_json::to_string(&CurrentPointer {
        session_id: session_id.to_string(),
    })?;
    fs::write(&path, json).map_err(|e| TdError::io(&path, e))?;
    Ok(())
}

fn migrate_legacy(store_root: &Path, branch: &str, fp: &str) -> TdResult<Option<SessionRecord>> {
    for legacy in [
        legacy_single_session_path(store_root),
        legacy_branch_session_path(store_root, branch),
    ] {
        if legacy.exists() {
            let content = fs::read_to_string(&legacy).map_err(|e| TdError::io(&legacy, e))?;
            if let Ok(record) = serde_json::from_str::<SessionRecord>(&content) {
                let dest = session_path(store_root, branch, fp);
                write_record(&dest, &record)?;
                let _ = fs::remove_file(&legacy);
                return Ok(Some(record));
            }
        }
    }
    Ok(None)
}

fn write_record(path: &Path, record: &SessionRecord) -> TdResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TdError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(record)?;
    fs::write(path, json).map_err(|e| TdError::io(path, e))?;
    Ok(())
}

/// Get (creating if necessary) the session record for `(branch, fingerprint)`,
/// refreshing `last_activity` on every access.
pub fn get_or_create(
    store_root: &Path,
    branch: &str,
    fingerprint: &str,
    agent_type: &str,
    parent_pid: u32,
    context_id: &str,
) -> TdResult<SessionRecord> {
    let path = session_path(store_root, branch, fingerprint);
    let now = Utc::now().to_rfc3339();

    if path.exists() {
        let content = fs::read_to_string(&path).map_err(|e| TdError::io(&path, e))?;
        let mut record: SessionRecord = serde_json::from_str(&content)?;
        record.last_activity = now;
        write_record(&path, &record)?;
        write_current_session_id(store_root, &record.id)?;
        return Ok(record);
    }

    if let Some(mut migrated) = migrate_legacy(store_root, branch, fingerprint)? {
        migrated.last_activity = now;
        write_record(&path, &migrated)?;
        write_current_session_id(store_root, &migrated.id)?;
        return Ok(migrated);
    }

    // Neither dimension (branch, fingerprint) has a record yet at this path.
    // If a session was previously active anywhere in this store, this is a
    // dimension change: chain `previous_session_id` to it.
    let previous_session_id = read_current_session_id(store_root);
    let record = SessionRecord {
        id: generate(IdKind::Session),
        name: None,
        branch: branch.to_string(),
        agent_type: agent_type.to_string(),
        parent_pid,
        original_context_id: context_id.to_string(),
        previous_session_id,
        started_at: now.clone(),
        last_activity: now,
    };
    write_record(&path, &record)?;
    write_current_session_id(store_root, &record.id)?;
    Ok(record)
}

/// Force rotation: create a new session record chained to the current one
/// via `previous_session_id`; used when either the branch or fingerprint
/// changes, or when a forced rotation is requested.
pub fn rotate(
    store_root: &Path,
    branch: &str,
    fingerprint: &str,
    agent_type: &str,
    parent_pid: u32,
    context_id: &str,
) -> TdResult<SessionRecord> {
    let path = session_path(store_root, branch, fingerprint);
    // A rotation at the same (branch, fingerprint) chains to the record
    // already there; a rotation that also lands on a fresh path (dimension
    // change plus forced rotation) falls back to whatever session was last
    // active in this store, same as `get_or_create`.
    let previous_id = if path.exists() {
        let content = fs::read_to_string(&path).map_err(|e| TdError::io(&path, e))?;
        serde_json::from_str::<SessionRecord>(&content)
        .ok()
        .map(|r| r.id)
    } else {
        None
    }
    .or_else(|| read_current_session_id(store_root));

    let now = Utc::now().to_rfc3339();
    let record = SessionRecord {
        id: generate(IdKind::Session),
        name: None,
        branch: branch.to_string(),
        agent_type: agent_type.to_string(),
        parent_pid,
        original_context_id: context_id.to_string(),
        previous_session_id: previous_id,
        started_at: now.clone(),
        last_activity: now,
    };
    write_record(&path, &record)?;
    write_current_session_id(store_root, &record.id)?;
    Ok(record)
}

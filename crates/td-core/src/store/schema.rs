//! Store schema DDL and migrations.
//!
//! One idempotent `CREATE TABLE IF NOT EXISTS` batch plus a
//! `pragma_table_info`-gated `ALTER TABLE ADD COLUMN` migration step for
//! columns added after a store was first created.

use crate::error::{TdError, TdResult};
use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS issues (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL DEFAULT 'task',
    status TEXT NOT NULL DEFAULT 'open',
    priority TEXT NOT NULL DEFAULT 'P2',
    story_points INTEGER,
    labels TEXT NOT NULL DEFAULT '[]',
    parent TEXT REFERENCES issues(id),
    acceptance TEXT NOT NULL DEFAULT '',
    creator_session TEXT NOT NULL,
    implementer_session TEXT,
    reviewer_session TEXT,
    minor INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    closed_at TEXT,
    deleted_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
CREATE INDEX IF NOT EXISTS idx_issues_priority ON issues(priority);
CREATE INDEX IF NOT EXISTS idx_issues_type ON issues(type);
CREATE INDEX IF NOT EXISTS idx_issues_parent ON issues(parent);
CREATE INDEX IF NOT EXISTS idx_issues_deleted ON issues(deleted_at);

CREATE TABLE IF NOT EXISTS dependencies (
    issue_id TEXT NOT NULL REFERENCES issues(id),
    depends_on_id TEXT NOT NULL,
    relation_type TEXT NOT NULL DEFAULT 'blocks',
    created_at TEXT NOT NULL,
    PRIMARY KEY (issue_id, depends_on_id)
);
CREATE INDEX IF NOT EXISTS idx_dependencies_issue_id ON dependencies(issue_id);
CREATE INDEX IF NOT EXISTS idx_dependencies_depends_on_id ON dependencies(depends_on_id);

CREATE TABLE IF NOT EXISTS logs (
    id TEXT PRIMARY KEY,
    issue_id TEXT NOT NULL REFERENCES issues(id),
    session_id TEXT NOT NULL,
    tag TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_logs_issue_id ON logs(issue_id);

CREATE TABLE IF NOT EXISTS handoffs (
    id TEXT PRIMARY KEY,
    issue_id TEXT NOT NULL REFERENCES issues(id),
    session_id TEXT NOT NULL,
    version INTEGER NOT NULL,
    done TEXT NOT NULL DEFAULT '',
    remaining TEXT NOT NULL DEFAULT '',
    decisions TEXT NOT NULL DEFAULT '',
    uncertain TEXT NOT NULL DEFAULT '',
    files TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_handoffs_issue_id ON handoffs(issue_id);

CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    issue_id TEXT NOT NULL REFERENCES issues(id),
    session_id TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_comments_issue_id ON comments(issue_id);

CREATE TABLE IF NOT EXISTS git_snapshots (
    id TEXT PRIMARY KEY,
    issue_id TEXT NOT NULL REFERENCES issues(id),
    branch TEXT NOT NULL,
    commit_sha TEXT NOT NULL,
    dirty INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_git_snapshots_issue_id ON git_snapshots(issue_id);

CREATE TABLE IF NOT EXISTS issue_files (
    id TEXT PRIMARY KEY,
    issue_id TEXT NOT NULL REFERENCES issues(id),
    path TEXT NOT NULL,
    note TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_issue_files_issue_id ON issue_files(issue_id);

CREATE TABLE IF NOT EXISTS work_sessions (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    started_at TEXT NOT NULL,
    ended_at TEXT
);

CREATE TABLE IF NOT EXISTS work_session_issues (
    work_session_id TEXT NOT NULL REFERENCES work_sessions(id),
    issue_id TEXT NOT NULL REFERENCES issues(id),
    PRIMARY KEY (work_session_id, issue_id)
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    name TEXT,
    branch TEXT NOT NULL,
    agent_type TEXT NOT NULL,
    parent_pid INTEGER NOT NULL,
    original_context_id TEXT NOT NULL,
    previous_session_id TEXT,
    started_at TEXT NOT NULL,
    last_activity TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_branch ON sessions(branch);

CREATE TABLE IF NOT EXISTS boards (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS board_positions (
    board_id TEXT NOT NULL REFERENCES boards(id),
    issue_id TEXT NOT NULL REFERENCES issues(id),
    column_name TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (board_id, issue_id)
);

CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS action_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    session_id TEXT NOT NULL,
    action_type TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    previous_data TEXT,
    new_data TEXT,
    timestamp TEXT NOT NULL,
    undone INTEGER NOT NULL DEFAULT 0,
    synced_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_action_log_entity ON action_log(entity_type, entity_id);
CREATE INDEX IF NOT EXISTS idx_action_log_synced_at ON action_log(synced_at);

CREATE TABLE IF NOT EXISTS involvement (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    issue_id TEXT NOT NULL REFERENCES issues(id),
    session_id TEXT NOT NULL,
    action TEXT NOT NULL,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_involvement_issue_id ON involvement(issue_id);
CREATE INDEX IF NOT EXISTS idx_involvement_pair ON involvement(issue_id, session_id);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Columns added after the initial schema, gated on `pragma_table_info` so
/// `apply_schema` stays idempotent across repeated opens and old stores.
/// `(table, column, ddl_type_and_default)`.
const MIGRATIONS: &[(&str, &str, &str)] = &[];

fn column_exists(conn: &Connection, table: &str, column: &str) -> TdResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let exists = stmt
    .query_map([], |row| row.get::<_, String>(1))?
    .filter_map(Result::ok)
    .any(|name| name == column);
    Ok(exists)
}

/// Apply the schema and run any pending migrations. Returns the number of
/// migrations actually applied.
pub fn apply_schema(conn: &Connection) -> TdResult<u32> {
    conn.execute_batch(SCHEMA_SQL)?;

    let mut applied = 0;
    for (table, column, ddl) in MIGRATIONS {
        if !column_exists(conn, table, column)? {
            conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {ddl}"))
            .map_err(TdError::from)?;
            applied += 1;
        }
    }
    Ok(applied)
}

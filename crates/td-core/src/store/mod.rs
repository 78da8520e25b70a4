//! Embedded relational store.
//!
//! A single-file SQLite database with WAL journaling. Readers open the file
//! and never block on writers (or vice versa) at the database layer; writer
//! serialization across processes is the write lock's job, not the
//! store's.

mod schema;

use crate::error::{TdError, TdResult};
use crate::schema::{
    Board, BoardPosition, Comment, GitSnapshot, Handoff, Issue, IssueFile, IssuePriority,
    IssueStatus, IssueType, Log, LogTag, Note, WorkSession,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

pub struct Store {
    conn: Connection,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl Store {
    /// Open (creating if necessary) the store at `<store_root>/.todos/issues.db`.
    pub fn open(store_root: &Path) -> TdResult<Self> {
        let todos_dir = store_root.join(".todos");
        std::fs::create_dir_all(&todos_dir).map_err(|e| TdError::io(&todos_dir, e))?;
        let db_path = todos_dir.join("issues.db");
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "busy_timeout", 500)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::apply_schema(&conn)?;
        Ok(Self { conn, db_path })
    }

    /// Open an in-memory store; used by unit/integration tests so they never
    /// touch the filesystem's lock semantics.
    #[cfg(test)]
    pub fn open_in_memory() -> TdResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::apply_schema(&conn)?;
        Ok(Self {
                conn,
                db_path: PathBuf::from(":memory:"),
        })
    }

    /// Run (or re-run) migrations, reporting how many were applied.
    pub fn run_migrations(&self) -> TdResult<u32> {
        schema::apply_schema(&self.conn)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Issues ---------------------------------------------------------

    pub fn insert_issue(&self, issue: &Issue) -> TdResult<()> {
        let labels = serde_json::to_string(&issue.labels)?;
        self.conn.execute(
            "INSERT INTO issues (id, title, description, type, status, priority, story_points,
            labels, parent, acceptance, creator_session, implementer_session,
            reviewer_session, minor, created_at, updated_at, closed_at, deleted_at)
        VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18)",
            params![
                issue.id,
                issue.title,
                issue.description,
                issue.issue_type.as_str(),
                issue.status.as_str(),
                issue.priority.as_str(),
                issue.story_points,
                labels,
                issue.parent,
                issue.acceptance,
                issue.creator_session,
                issue.implementer_session,
                issue.reviewer_session,
                issue.minor as i64,
                issue.created_at,
                issue.updated_at,
                issue.closed_at,
                issue.deleted_at,
            ],
        )?;
        Ok(())
    }

    pub fn update_issue(&self, issue: &Issue) -> TdResult<()> {
        let labels = serde_json::to_string(&issue.labels)?;
        let rows = self.conn.execute(
            "UPDATE issues SET title=?2, description=?3, type=?4, status=?5, priority=?6,
        story_points=?7, labels=?8, parent=?9, acceptance=?10, creator_session=?11,
        implementer_session=?12, reviewer_session=?13, minor=?14, updated_at=?15,
        closed_at=?16, deleted_at=?17
        WHERE id=?1",
            params![
                issue.id,
                issue.title,
                issue.description,
                issue.issue_type.as_str(),
                issue.status.as_str(),
                issue.priority.as_str(),
                issue.story_points,
                labels,
                issue.parent,
                issue.acceptance,
                issue.creator_session,
                issue.implementer_session,
                issue.reviewer_session,
                issue.minor as i64,
                issue.updated_at,
                issue.closed_at,
                issue.deleted_at,
            ],
        )?;
        if rows == 0 {
            return Err(TdError::NotFound(format!("issue {}", issue.id)));
        }
        Ok(())
    }

    pub fn get_issue(&self, id: &str) -> TdResult<Issue> {
        self.conn
        .query_row("SELECT * FROM issues WHERE id = ?1", params![id], row_to_issue)
        .optional()?
        .ok_or_else(|| TdError::NotFound(format!("issue {id}")))
    }

    /// All non-deleted issues, unordered (callers sort/filter as needed —
    /// TDQ's evaluator and the dependency engine both want the raw set).
    pub fn list_issues(&self, include_deleted: bool) -> TdResult<Vec<Issue>> {
        let sql = if include_deleted {
            "SELECT * FROM issues"
        } else {
            "SELECT * FROM issues WHERE deleted_at IS NULL"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], row_to_issue)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    pub fn children_of(&self, parent_id: &str) -> TdResult<Vec<Issue>> {
        let mut stmt = self
        .conn
        .prepare("SELECT * FROM issues WHERE parent = ?1")?;
        let rows = stmt.query_map(params![parent_id], row_to_issue)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    // --- Dependencies -----------------------------------------------------

    pub fn insert_dependency(&self, issue_id: &str, depends_on_id: &str, relation: &str, now: &str) -> TdResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO dependencies (issue_id, depends_on_id, relation_type, created_at)
        VALUES (?1,?2,?3,?4)",
            params![issue_id, depends_on_id, relation, now],
        )?;
        Ok(())
    }

    pub fn dependencies_of(&self, issue_id: &str) -> TdResult<Vec<(String, String)>> {
        let mut stmt = self
        .conn
        .prepare("SELECT depends_on_id, relation_type FROM dependencies WHERE issue_id = ?1")?;
        let rows = stmt.query_map(params![issue_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    pub fn all_dependencies(&self) -> TdResult<Vec<(String, String)>> {
        let mut stmt = self
        .conn
        .prepare("SELECT issue_id, depends_on_id FROM dependencies")?;
        let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    // --- Satellites ---------------------------------------------------------

    pub fn insert_log(&self, log: &Log) -> TdResult<()> {
        self.conn.execute(
            "INSERT INTO logs (id, issue_id, session_id, tag, message, created_at)
        VALUES (?1,?2,?3,?4,?5,?6)",
            params![log.id, log.issue_id, log.session_id, log.tag.as_str(), log.message, log.created_at],
        )?;
        Ok(())
    }

    pub fn logs_for_issue(&self, issue_id: &str) -> TdResult<Vec<Log>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, issue_id, session_id, tag, message, created_at FROM logs
        WHERE issue_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![issue_id], |row| {
                let tag_str: String = row.get(3)?;
                Ok(Log {
                        id: row.get(0)?,
                        issue_id: row.get(1)?,
                        session_id: row.get(2)?,
                        tag: LogTag::parse(&tag_str).unwrap_or(LogTag::Progress),
                        message: row.get(4)?,
                        created_at: row.get(5)?,
                })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    pub fn insert_handoff(&self, handoff: &Handoff) -> TdResult<()> {
        let files = serde_json::to_string(&handoff.files)?;
        self.conn.execute(
            "INSERT INTO handoffs (id, issue_id, session_id, version, done, remaining, decisions,
        uncertain, files, created_at)
    VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                handoff.id,
                handoff.issue_id,
                handoff.session_id,
                handoff.version,
                handoff.done,
                handoff.remaining,
                handoff.decisions,
                handoff.uncertain,
                files,
                handoff.created_at,
            ],
        )?;
        Ok(())
    }

    /// The highest handoff `version` recorded for an issue, or 0 if none.
    pub fn latest_handoff_version(&self, issue_id: &str) -> TdResult<i64> {
        let version: Option<i64> = self.conn.query_row(
            "SELECT MAX(version) FROM handoffs WHERE issue_id = ?1",
            params![issue_id],
            |row| row.get(0),
        )?;
        Ok(version.unwrap_or(0))
    }

    pub fn insert_comment(&self, comment: &Comment) -> TdResult<()> {
        self.conn.execute(
            "INSERT INTO comments (id, issue_id, session_id, body, created_at) VALUES (?1,?2,?3,?4,?5)",
            params![comment.id, comment.issue_id, comment.session_id, comment.body, comment.created_at],
        )?;
        Ok(())
    }

    pub fn insert_git_snapshot(&self, snapshot: &GitSnapshot) -> TdResult<()> {
        self.conn.execute(
            "INSERT INTO git_snapshots (id, issue_id, branch, commit_sha, dirty, created_at)
        VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                snapshot.id,
                snapshot.issue_id,
                snapshot.branch,
                snapshot.commit,
                snapshot.dirty as i64,
                snapshot.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn insert_issue_file(&self, file: &IssueFile) -> TdResult<()> {
        self.conn.execute(
            "INSERT INTO issue_files (id, issue_id, path, note, created_at) VALUES (?1,?2,?3,?4,?5)",
            params![file.id, file.issue_id, file.path, file.note, file.created_at],
        )?;
        Ok(())
    }

    pub fn comments_for_issue(&self, issue_id: &str) -> TdResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, issue_id, session_id, body, created_at FROM comments
        WHERE issue_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![issue_id], |row| {
                Ok(Comment {
                        id: row.get(0)?,
                        issue_id: row.get(1)?,
                        session_id: row.get(2)?,
                        body: row.get(3)?,
                        created_at: row.get(4)?,
                })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    pub fn handoffs_for_issue(&self, issue_id: &str) -> TdResult<Vec<Handoff>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, issue_id, session_id, version, done, remaining, decisions, uncertain,
        files, created_at
        FROM handoffs WHERE issue_id = ?1 ORDER BY version ASC",
        )?;
        let rows = stmt.query_map(params![issue_id], row_to_handoff)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    pub fn git_snapshots_for_issue(&self, issue_id: &str) -> TdResult<Vec<GitSnapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, issue_id, branch, commit_sha, dirty, created_at FROM git_snapshots
        WHERE issue_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![issue_id], |row| {
                Ok(GitSnapshot {
                        id: row.get(0)?,
                        issue_id: row.get(1)?,
                        branch: row.get(2)?,
                        commit: row.get(3)?,
                        dirty: row.get::<_, i64>(4)? != 0,
                        created_at: row.get(5)?,
                })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    pub fn issue_files_for_issue(&self, issue_id: &str) -> TdResult<Vec<IssueFile>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, issue_id, path, note, created_at FROM issue_files
        WHERE issue_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![issue_id], |row| {
                Ok(IssueFile {
                        id: row.get(0)?,
                        issue_id: row.get(1)?,
                        path: row.get(2)?,
                        note: row.get(3)?,
                        created_at: row.get(4)?,
                })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    // --- Notes (standalone) -------------------------------------------------

    pub fn insert_note(&self, note: &Note) -> TdResult<()> {
        self.conn.execute(
            "INSERT INTO notes (id, title, body, created_at, updated_at, deleted_at)
        VALUES (?1,?2,?3,?4,?5,?6)",
            params![note.id, note.title, note.body, note.created_at, note.updated_at, note.deleted_at],
        )?;
        Ok(())
    }

    pub fn update_note(&self, note: &Note) -> TdResult<()> {
        let rows = self.conn.execute(
            "UPDATE notes SET title=?2, body=?3, updated_at=?4, deleted_at=?5 WHERE id=?1",
            params![note.id, note.title, note.body, note.updated_at, note.deleted_at],
        )?;
        if rows == 0 {
            return Err(TdError::NotFound(format!("note {}", note.id)));
        }
        Ok(())
    }

    pub fn get_note(&self, id: &str) -> TdResult<Note> {
        self.conn
        .query_row("SELECT * FROM notes WHERE id = ?1", params![id], row_to_note)
        .optional()?
        .ok_or_else(|| TdError::NotFound(format!("note {id}")))
    }

    pub fn list_notes(&self, include_deleted: bool) -> TdResult<Vec<Note>> {
        let sql = if include_deleted {
            "SELECT * FROM notes"
        } else {
            "SELECT * FROM notes WHERE deleted_at IS NULL"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], row_to_note)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    // --- Boards ---------------------------------------------------------

    pub fn insert_board(&self, board: &Board) -> TdResult<()> {
        self.conn.execute(
            "INSERT INTO boards (id, name, created_at) VALUES (?1,?2,?3)",
            params![board.id, board.name, board.created_at],
        )?;
        Ok(())
    }

    pub fn get_board(&self, id: &str) -> TdResult<Board> {
        self.conn
        .query_row(
            "SELECT id, name, created_at FROM boards WHERE id = ?1",
            params![id],
            |row| {
                Ok(Board {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| TdError::NotFound(format!("board {id}")))
    }

    pub fn list_boards(&self) -> TdResult<Vec<Board>> {
        let mut stmt = self.conn.prepare("SELECT id, name, created_at FROM boards")?;
        let rows = stmt.query_map([], |row| {
                Ok(Board {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    pub fn upsert_board_position(&self, position: &BoardPosition) -> TdResult<()> {
        self.conn.execute(
            "INSERT INTO board_positions (board_id, issue_id, column_name, position)
        VALUES (?1,?2,?3,?4)
        ON CONFLICT(board_id, issue_id) DO UPDATE SET column_name=excluded.column_name,
        position=excluded.position",
            params![position.board_id, position.issue_id, position.column, position.position],
        )?;
        Ok(())
    }

    pub fn board_positions(&self, board_id: &str) -> TdResult<Vec<BoardPosition>> {
        let mut stmt = self.conn.prepare(
            "SELECT board_id, issue_id, column_name, position FROM board_positions
        WHERE board_id = ?1 ORDER BY column_name, position",
        )?;
        let rows = stmt.query_map(params![board_id], |row| {
                Ok(BoardPosition {
                        board_id: row.get(0)?,
                        issue_id: row.get(1)?,
                        column: row.get(2)?,
                        position: row.get(3)?,
                })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    // --- Work sessions ----------------------------------------------------

    pub fn insert_work_session(&self, ws: &WorkSession) -> TdResult<()> {
        self.conn.execute(
            "INSERT INTO work_sessions (id, session_id, started_at, ended_at) VALUES (?1,?2,?3,?4)",
            params![ws.id, ws.session_id, ws.started_at, ws.ended_at],
        )?;
        for issue_id in &ws.issue_ids {
            self.add_work_session_issue(&ws.id, issue_id)?;
        }
        Ok(())
    }

    pub fn end_work_session(&self, id: &str, ended_at: &str) -> TdResult<()> {
        let rows = self.conn.execute(
            "UPDATE work_sessions SET ended_at = ?2 WHERE id = ?1",
            params![id, ended_at],
        )?;
        if rows == 0 {
            return Err(TdError::NotFound(format!("work session {id}")));
        }
        Ok(())
    }

    pub fn add_work_session_issue(&self, work_session_id: &str, issue_id: &str) -> TdResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO work_session_issues (work_session_id, issue_id) VALUES (?1,?2)",
            params![work_session_id, issue_id],
        )?;
        Ok(())
    }

    pub fn work_session_issues(&self, work_session_id: &str) -> TdResult<Vec<String>> {
        let mut stmt = self
        .conn
        .prepare("SELECT issue_id FROM work_session_issues WHERE work_session_id = ?1")?;
        let rows = stmt.query_map(params![work_session_id], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TdError::from)
    }

    pub fn get_work_session(&self, id: &str) -> TdResult<WorkSession> {
        let (session_id, started_at, ended_at): (String, String, Option<String>) = self
        .conn
        .query_row(
            "SELECT session_id, started_at, ended_at FROM work_sessions WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?
        .ok_or_else(|| TdError::NotFound(format!("work session {id}")))?;

        let issue_ids = self.work_session_issues(id)?;

        Ok(WorkSession {
                id: id.to_string(),
                session_id,
                started_at,
                ended_at,
                issue_ids,
        })
    }
}

fn row_to_issue(row: &Row) -> rusqlite::Result<Issue> {
    let labels_json: String = row.get("labels")?;
    let labels: Vec<String> = serde_json::from_str(&labels_json).unwrap_or_default();
    let status_str: String = row.get("status")?;
    let type_str: String = row.get("type")?;
    let priority_str: String = row.get("priority")?;
    Ok(Issue {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            issue_type: IssueType::parse(&type_str).unwrap_or(IssueType::Task),
            status: IssueStatus::parse(&status_str).unwrap_or(IssueStatus::Open),
            priority: IssuePriority::parse(&priority_str).unwrap_or(IssuePriority::P2),
            story_points: row.get("story_points")?,
            labels,
            parent: row.get("parent")?,
            acceptance: row.get("acceptance")?,
            creator_session: row.get("creator_session")?,
            implementer_session: row.get("implementer_session")?,
            reviewer_session: row.get("reviewer_session")?,
            minor: row.get::<_, i64>("minor")? != 0,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            closed_at: row.get("closed_at")?,
            deleted_at: row.get("deleted_at")?,
            unknown_fields: Default::default(),
    })
}

fn row_to_handoff(row: &Row) -> rusqlite::Result<Handoff> {
    let files_json: String = row.get(8)?;
    let files: Vec<String> = serde_json::from_str(&files_json).unwrap_or_default();
    Ok(Handoff {
            id: row.get(0)?,
            issue_id: row.get(1)?,
            session_id: row.get(2)?,
            version: row.get(3)?,
            done: row.get(4)?,
            remaining: row.get(5)?,
            decisions: row.get(6)?,
            uncertain: row.get(7)?,
            files,
            created_at: row.get(9)?,
    })
}

fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
    Ok(Note {
            id: row.get("id")?,
            title: row.get("title")?,
            body: row.get("body")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            deleted_at: row.get("deleted_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_issue(id: &str) -> Issue {
        let now = Utc::now().to_rfc3339();
        Issue {
            id: id.to_string(),
            title: "sample".to_string(),
            description: String::new(),
            issue_type: IssueType::Task,
            status: IssueStatus::Open,
            priority: IssuePriority::P2,
            story_points: None,
            labels: vec![],
            parent: None,
            acceptance: String::new(),
            creator_session: "ses_aaaaaaaa".to_string(),
            implementer_session: None,
            reviewer_session: None,
            minor: false,
            created_at: now.clone(),
            updated_at: now,
            closed_at: None,
            deleted_at: None,
            unknown_fields: Default::default(),
        }
    }

    #[test]
    fn opens_and_migrates_cleanly() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.run_migrations().unwrap(), 0);
    }

    #[test]
    fn insert_get_update_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let issue = sample_issue("td-abc123");
        store.insert_issue(&issue).unwrap();

        let fetched = store.get_issue("td-abc123").unwrap();
        assert_eq!(fetched.title, "sample");

        let mut updated = fetched;
        updated.title = "renamed".to_string();
        store.update_issue(&updated).unwrap();
        assert_eq!(store.get_issue("td-abc123").unwrap().title, "renamed");
    }

    #[test]
    fn get_missing_issue_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = store.get_issue("td-ffffff").unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn list_issues_excludes_deleted_by_default() {
        let store = Store::open_in_memory().unwrap();
        let mut a = sample_issue("td-111111");
        store.insert_issue(&a).unwrap();
        let mut b = sample_issue("td-222222");
        b.deleted_at = Some(Utc::now().to_rfc3339());
        store.insert_issue(&b).unwrap();

        assert_eq!(store.list_issues(false).unwrap().len(), 1);
        assert_eq!(store.list_issues(true).unwrap().len(), 2);

        a.title = "x".into();
        let _ = a;
    }
}

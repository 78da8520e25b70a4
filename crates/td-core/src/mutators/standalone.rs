//! Logged mutators for the entities that are standalone (notes, boards,
//! work sessions) or a graph edge owned by no single
//! issue (dependencies). Same lock-mutate-log sequence as
//! [`super::satellites`]: acquire the write lock, mutate, append an
//! action-log entry, release.

use super::Kernel;
use crate::action_log;
use crate::error::{TdError, TdResult};
use crate::id::{generate, normalize, IdKind};
use crate::lock;
use crate::schema::{Board, BoardPosition, Note, WorkSession};
use chrono::Utc;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct CreateNoteInput {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateBoardInput {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct SetBoardPositionInput {
    pub board_id: String,
    pub issue_id: String,
    pub column: String,
    pub position: i64,
}

#[derive(Debug, Clone, Default)]
pub struct StartWorkSessionInput {
    pub issue_ids: Vec<String>,
}

impl Kernel {
    // --- Notes --------------------------------------------------------

    pub fn create_note(&self, actor: &super::Actor, input: CreateNoteInput) -> TdResult<Note> {
        let _guard = lock::acquire(&self.lock_path())?;
        let now = Utc::now().to_rfc3339();
        let note = Note {
            id: generate(IdKind::Note),
            title: input.title,
            body: input.body,
            created_at: now.clone(),
            updated_at: now.clone(),
            deleted_at: None,
        };
        self.store().insert_note(&note)?;
        let new_data = serde_json::to_string(&note)?;
        action_log::append(self.store(), actor.session_id, "create", "note", &note.id, None, Some(&new_data), &now)?;
        Ok(note)
    }

    pub fn update_note(&self, actor: &super::Actor, id: &str, patch: NoteUpdate) -> TdResult<Note> {
        let _guard = lock::acquire(&self.lock_path())?;
        let id = normalize(IdKind::Note, id)?;
        let before = self.store().get_note(&id)?;
        let previous_data = serde_json::to_string(&before)?;

        let mut after = before;
        if let Some(v) = patch.title {
            after.title = v;
        }
        if let Some(v) = patch.body {
            after.body = v;
        }
        after.updated_at = Utc::now().to_rfc3339();
        self.store().update_note(&after)?;

        let new_data = serde_json::to_string(&after)?;
        action_log::append(
            self.store(),
            actor.session_id,
            "update",
            "note",
            &after.id,
            Some(&previous_data),
            Some(&new_data),
            &after.updated_at,
        )?;
        Ok(after)
    }

    pub fn delete_note(&self, actor: &super::Actor, id: &str) -> TdResult<Note> {
        let _guard = lock::acquire(&self.lock_path())?;
        let id = normalize(IdKind::Note, id)?;
        let before = self.store().get_note(&id)?;
        let previous_data = serde_json::to_string(&before)?;

        let mut after = before;
        let now = Utc::now().to_rfc3339();
        after.deleted_at = Some(now.clone());
        after.updated_at = now.clone();
        self.store().update_note(&after)?;

        action_log::append(self.store(), actor.session_id, "delete", "note", &after.id, Some(&previous_data), None, &now)?;
        Ok(after)
    }

    pub fn restore_note(&self, actor: &super::Actor, id: &str) -> TdResult<Note> {
        let _guard = lock::acquire(&self.lock_path())?;
        let id = normalize(IdKind::Note, id)?;
        let before = self.store().get_note(&id)?;
        let previous_data = serde_json::to_string(&before)?;

        let mut after = before;
        let now = Utc::now().to_rfc3339();
        after.deleted_at = None;
        after.updated_at = now.clone();
        self.store().update_note(&after)?;

        let new_data = serde_json::to_string(&after)?;
        action_log::append(
            self.store(),
            actor.session_id,
            "restore",
            "note",
            &after.id,
            Some(&previous_data),
            Some(&new_data),
            &now,
        )?;
        Ok(after)
    }

    // --- Boards ---------------------------------------------------------

    pub fn create_board(&self, actor: &super::Actor, input: CreateBoardInput) -> TdResult<Board> {
        let _guard = lock::acquire(&self.lock_path())?;
        let now = Utc::now().to_rfc3339();
        let board = Board {
            id: generate(IdKind::Board),
            name: input.name,
            created_at: now.clone(),
        };
        self.store().insert_board(&board)?;
        let new_data = serde_json::to_string(&board)?;
        action_log::append(self.store(), actor.session_id, "create", "board", &board.id, None, Some(&new_data), &now)?;
        Ok(board)
    }

    /// Boards carry no independent status lifecycle; moving an issue
    /// between columns is a position upsert, logged as an `update` against
    /// the board itself — board positions are board-owned, not issue-owned.
    pub fn set_board_position(&self, actor: &super::Actor, input: SetBoardPositionInput) -> TdResult<BoardPosition> {
        let _guard = lock::acquire(&self.lock_path())?;
        let board_id = normalize(IdKind::Board, &input.board_id)?;
        let issue_id = normalize(IdKind::Issue, &input.issue_id)?;
        self.store().get_board(&board_id)?;
        self.store().get_issue(&issue_id)?;

        let position = BoardPosition {
            board_id,
            issue_id,
            column: input.column,
            position: input.position,
        };
        self.store().upsert_board_position(&position)?;
        let now = Utc::now().to_rfc3339();
        let new_data = serde_json::to_string(&position)?;
        action_log::append(
            self.store(),
            actor.session_id,
            "update",
            "board_position",
            &position.board_id,
            None,
            Some(&new_data),
            &now,
        )?;
        Ok(position)
    }

    // --- Work sessions ----------------------------------------------------

    pub fn start_work_session(&self, actor: &super::Actor, input: StartWorkSessionInput) -> TdResult<WorkSession> {
        let _guard = lock::acquire(&self.lock_path())?;
        for issue_id in &input.issue_ids {
            self.store().get_issue(&normalize(IdKind::Issue, issue_id)?)?;
        }
        let now = Utc::now().to_rfc3339();
        let ws = WorkSession {
            id: generate(IdKind::WorkSession),
            session_id: actor.session_id.to_string(),
            started_at: now.clone(),
            ended_at: None,
            issue_ids: input.issue_ids,
        };
        self.store().insert_work_session(&ws)?;
        let new_data = serde_json::to_string(&ws)?;
        action_log::append(self.store(), actor.session_id, "create", "work_session", &ws.id, None, Some(&new_data), &now)?;
        Ok(ws)
    }

    pub fn end_work_session(&self, actor: &super::Actor, id: &str) -> TdResult<WorkSession> {
        let _guard = lock::acquire(&self.lock_path())?;
        let id = normalize(IdKind::WorkSession, id)?;
        let before = self.store().get_work_session(&id)?;
        let previous_data = serde_json::to_string(&before)?;
        let now = Utc::now().to_rfc3339();
        self.store().end_work_session(&id, &now)?;
        let after = self.store().get_work_session(&id)?;
        let new_data = serde_json::to_string(&after)?;
        action_log::append(
            self.store(),
            actor.session_id,
            "update",
            "work_session",
            &after.id,
            Some(&previous_data),
            Some(&new_data),
            &now,
        )?;
        Ok(after)
    }

    pub fn add_work_session_issue(&self, actor: &super::Actor, work_session_id: &str, issue_id: &str) -> TdResult<WorkSession> {
        let _guard = lock::acquire(&self.lock_path())?;
        let work_session_id = normalize(IdKind::WorkSession, work_session_id)?;
        let issue_id = normalize(IdKind::Issue, issue_id)?;
        self.store().get_issue(&issue_id)?;
        let before = self.store().get_work_session(&work_session_id)?;
        let previous_data = serde_json::to_string(&before)?;
        self.store().add_work_session_issue(&work_session_id, &issue_id)?;
        let after = self.store().get_work_session(&work_session_id)?;
        let now = Utc::now().to_rfc3339();
        let new_data = serde_json::to_string(&after)?;
        action_log::append(
            self.store(),
            actor.session_id,
            "update",
            "work_session",
            &after.id,
            Some(&previous_data),
            Some(&new_data),
            &now,
        )?;
        Ok(after)
    }

    // --- Dependencies -----------------------------------------------------

    /// Adds a `depends_on` edge. The store does not enforce acyclicity —
    /// acyclic by contract, not by constraint — so this walks the existing
    /// graph from
    /// `depends_on_id` to confirm it cannot already reach `issue_id` before
    /// inserting the new edge.
    pub fn add_dependency(&self, actor: &super::Actor, issue_id: &str, depends_on_id: &str) -> TdResult<()> {
        let _guard = lock::acquire(&self.lock_path())?;
        let issue_id = normalize(IdKind::Issue, issue_id)?;
        let depends_on_id = normalize(IdKind::Issue, depends_on_id)?;
        if issue_id == depends_on_id {
            return Err(TdError::InvalidInput("an issue cannot depend on itself".to_string()));
        }
        self.store().get_issue(&issue_id)?;
        self.store().get_issue(&depends_on_id)?;

        let all_deps = self.store().all_dependencies()?;
        if would_cycle(&all_deps, &issue_id, &depends_on_id) {
            return Err(TdError::InvalidInput(format!(
                "adding {issue_id} -> {depends_on_id} would create a dependency cycle"
            )));
        }

        let now = Utc::now().to_rfc3339();
        self.store().insert_dependency(&issue_id, &depends_on_id, "blocks", &now)?;
        let new_data = serde_json::to_string(&serde_json::json!({
            "issue_id": issue_id,
            "depends_on_id": depends_on_id,
        }))?;
        action_log::append(self.store(), actor.session_id, "create", "dependency", &issue_id, None, Some(&new_data), &now)?;
        Ok(())
    }
}

/// True if `depends_on_id` can already (transitively) reach `issue_id`,
/// i.e. inserting `issue_id -> depends_on_id` would close a cycle.
fn would_cycle(edges: &[(String, String)], issue_id: &str, depends_on_id: &str) -> bool {
    let mut frontier = vec![depends_on_id.to_string()];
    let mut seen: HashSet<String> = HashSet::new();
    while let Some(current) = frontier.pop() {
        if current == issue_id {
            return true;
        }
        if !seen.insert(current.clone()) {
            continue;
        }
        for (from, to) in edges {
            if from == &current {
                frontier.push(to.clone());
            }
        }
    }
    false
}

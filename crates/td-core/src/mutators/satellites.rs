//! Mutators for the satellite entities owned by an issue: logs, handoffs,
//! comments, git snapshots, and issue-files. All are append-only creates —
//! none of these are ever updated or deleted once recorded — so each still
//! runs the full logged-mutator sequence (lock, mutate,
//! action-log) but has no corresponding update/delete mutator.

use super::Kernel;
use crate::action_log;
use crate::error::TdResult;
use crate::id::{generate, normalize, IdKind};
use crate::lock;
use crate::schema::{Comment, GitSnapshot, Handoff, IssueFile, Log, LogTag};
use chrono::Utc;

#[derive(Debug, Clone, Default)]
pub struct CreateLogInput {
    pub issue_id: String,
    pub tag: LogTag,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct CreateHandoffInput {
    pub issue_id: String,
    pub done: String,
    pub remaining: String,
    pub decisions: String,
    pub uncertain: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateCommentInput {
    pub issue_id: String,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct CreateGitSnapshotInput {
    pub issue_id: String,
    pub branch: String,
    pub commit: String,
    pub dirty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CreateIssueFileInput {
    pub issue_id: String,
    pub path: String,
    pub note: Option<String>,
}

impl Kernel {
    pub fn create_log(&self, actor: &super::Actor, input: CreateLogInput) -> TdResult<Log> {
        let _guard = lock::acquire(&self.lock_path())?;
        let issue_id = normalize(IdKind::Issue, &input.issue_id)?;
        self.store().get_issue(&issue_id)?; // 404s if missing
        let now = Utc::now().to_rfc3339();
        let log = Log {
            id: generate(IdKind::Log),
            issue_id,
            session_id: actor.session_id.to_string(),
            tag: input.tag,
            message: input.message,
            created_at: now.clone(),
        };
        self.store().insert_log(&log)?;
        let new_data = serde_json::to_string(&log)?;
        action_log::append(
            self.store(),
            actor.session_id,
            "create",
            "log",
            &log.id,
            None,
            Some(&new_data),
            &now,
        )?;
        Ok(log)
    }

    /// Handoff version auto-increments per issue; handoffs are versioned
    /// structured snapshots, never overwritten in place.
    pub fn create_handoff(&self, actor: &super::Actor, input: CreateHandoffInput) -> TdResult<Handoff> {
        let _guard = lock::acquire(&self.lock_path())?;
        let issue_id = normalize(IdKind::Issue, &input.issue_id)?;
        self.store().get_issue(&issue_id)?;
        let version = self.store().latest_handoff_version(&issue_id)? + 1;
        let now = Utc::now().to_rfc3339();
        let handoff = Handoff {
            id: generate(IdKind::Handoff),
            issue_id,
            session_id: actor.session_id.to_string(),
            version,
            done: input.done,
            remaining: input.remaining,
            decisions: input.decisions,
            uncertain: input.uncertain,
            files: input.files,
            created_at: now.clone(),
        };
        self.store().insert_handoff(&handoff)?;
        let new_data = serde_json::to_string(&handoff)?;
        action_log::append(
            self.store(),
            actor.session_id,
            "create",
            "handoff",
            &handoff.id,
            None,
            Some(&new_data),
            &now,
        )?;
        Ok(handoff)
    }

    pub fn create_comment(&self, actor: &super::Actor, input: CreateCommentInput) -> TdResult<Comment> {
        let _guard = lock::acquire(&self.lock_path())?;
        let issue_id = normalize(IdKind::Issue, &input.issue_id)?;
        self.store().get_issue(&issue_id)?;
        let now = Utc::now().to_rfc3339();
        let comment = Comment {
            id: generate(IdKind::Comment),
            issue_id,
            session_id: actor.session_id.to_string(),
            body: input.body,
            created_at: now.clone(),
        };
        self.store().insert_comment(&comment)?;
        let new_data = serde_json::to_string(&comment)?;
        action_log::append(
            self.store(),
            actor.session_id,
            "create",
            "comment",
            &comment.id,
            None,
            Some(&new_data),
            &now,
        )?;
        Ok(comment)
    }

    pub fn create_git_snapshot(&self, actor: &super::Actor, input: CreateGitSnapshotInput) -> TdResult<GitSnapshot> {
        let _guard = lock::acquire(&self.lock_path())?;
        let issue_id = normalize(IdKind::Issue, &input.issue_id)?;
        self.store().get_issue(&issue_id)?;
        let now = Utc::now().to_rfc3339();
        let snapshot = GitSnapshot {
            id: generate(IdKind::GitSnapshot),
            issue_id,
            branch: input.branch,
            commit: input.commit,
            dirty: input.dirty,
            created_at: now.clone(),
        };
        self.store().insert_git_snapshot(&snapshot)?;
        let new_data = serde_json::to_string(&snapshot)?;
        action_log::append(
            self.store(),
            actor.session_id,
            "create",
            "git_snapshot",
            &snapshot.id,
            None,
            Some(&new_data),
            &now,
        )?;
        Ok(snapshot)
    }

    pub fn attach_issue_file(&self, actor: &super::Actor, input: CreateIssueFileInput) -> TdResult<IssueFile> {
        let _guard = lock::acquire(&self.lock_path())?;
        let issue_id = normalize(IdKind::Issue, &input.issue_id)?;
        self.store().get_issue(&issue_id)?;
        let now = Utc::now().to_rfc3339();
        let file = IssueFile {
            id: generate(IdKind::IssueFile),
            issue_id,
            path: input.path,
            note: input.note,
            created_at: now.clone(),
        };
        self.store().insert_issue_file(&file)?;
        let new_data = serde_json::to_string(&file)?;
        action_log::append(
            self.store(),
            actor.session_id,
            "create",
            "issue_file",
            &file.id,
            None,
            Some(&new_data),
            &now,
        )?;
        Ok(file)
    }
}

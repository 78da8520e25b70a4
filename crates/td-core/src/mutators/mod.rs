//! Logged mutators: the only supported path for writes.
//!
//! Every externally-callable mutation runs the same atomic sequence:
//! acquire the write lock, validate against the state machine and
//! bypass policy, snapshot the entity before and after, mutate the store,
//! append an action-log entry, conditionally append an involvement entry,
//! release the lock. Failure at any step unwinds the lock (via `WriteLock`'s
//! `Drop`) and returns the first error — no partial writes are observable
//! because the in-process mutation is a single SQLite statement sequence and
//! the lock excludes every other process.
//!
//! Direct [`crate::store::Store`] access from outside this module is
//! possible in Rust's visibility model but is a convention violation: every
//! caller (CLI, TUI, tests) should go through a `Kernel` method.

mod satellites;
mod standalone;

pub use satellites::{CreateCommentInput, CreateGitSnapshotInput, CreateHandoffInput, CreateIssueFileInput, CreateLogInput};
pub use standalone::{
    CreateBoardInput, CreateNoteInput, NoteUpdate, SetBoardPositionInput, StartWorkSessionInput,
};

use crate::action_log;
use crate::bypass::{self, SelfCloseException};
use crate::error::{TdError, TdResult};
use crate::involvement::{self, InvolvementAction};
use crate::lock;
use crate::schema::{Issue, IssuePriority, IssueStatus, IssueType, VALID_STORY_POINTS};
use crate::security_log::{self, SecurityEvent};
use crate::state_machine::{self, EnforcementMode, TransitionContext};
use crate::store::Store;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Per-call actor/context, threaded through every mutator.
#[derive(Debug, Clone)]
pub struct Actor<'a> {
    pub session_id: &'a str,
    pub agent_type: &'a str,
    /// `"admin"` relaxes `DifferentReviewerGuard`.
    pub context_role: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct TransitionOptions {
    /// Bypasses `BlockedGuard` on `blocked -> in_progress`.
    pub force: bool,
    /// An audited self-close bypass; only consulted by `close`.
    pub self_close_reason: Option<String>,
}

/// Inputs accepted by `create_issue`; everything besides `title` and
/// `issue_type` has a documented default.
#[derive(Debug, Clone, Default)]
pub struct CreateIssueInput {
    pub title: String,
    pub description: String,
    pub issue_type: IssueType,
    pub priority: Option<IssuePriority>,
    pub story_points: Option<i64>,
    pub labels: Vec<String>,
    pub parent: Option<String>,
    pub acceptance: String,
    pub minor: bool,
}

/// A sparse patch applied to an existing issue; `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub issue_type: Option<IssueType>,
    pub priority: Option<IssuePriority>,
    pub story_points: Option<Option<i64>>,
    pub labels: Option<Vec<String>>,
    pub parent: Option<Option<String>>,
    pub acceptance: Option<String>,
    pub minor: Option<bool>,
}

/// Owns the store, the write-lock path, and the enforcement mode every
/// mutator validates under. One `Kernel` per resolved store root.
pub struct Kernel {
    store: Store,
    store_root: PathBuf,
    mode: EnforcementMode,
}

impl Kernel {
    pub fn open(store_root: &Path, mode: EnforcementMode) -> TdResult<Self> {
        let store = Store::open(store_root)?;
        Ok(Self {
                store,
                store_root: store_root.to_path_buf(),
                mode,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn lock_path(&self) -> PathBuf {
        self.store_root.join(".todos").join(".lock")
    }

    fn security_log_path(&self) -> PathBuf {
        self.store_root.join(".todos").join("security_events.jsonl")
    }

    // --- Issue CRUD -------------------------------------------------------

    pub fn create_issue(&self, actor: &Actor, input: CreateIssueInput) -> TdResult<Issue> {
        validate_story_points(input.story_points)?;
        let _guard = lock::acquire(&self.lock_path())?;
        let now = Utc::now().to_rfc3339();
        let issue = Issue {
            id: crate::id::generate(crate::id::IdKind::Issue),
            title: input.title,
            description: input.description,
            issue_type: input.issue_type,
            status: IssueStatus::Open,
            priority: input.priority.unwrap_or(IssuePriority::P2),
            story_points: input.story_points,
            labels: input.labels,
            parent: input.parent,
            acceptance: input.acceptance,
            creator_session: actor.session_id.to_string(),
            implementer_session: None,
            reviewer_session: None,
            minor: input.minor,
            created_at: now.clone(),
            updated_at: now.clone(),
            closed_at: None,
            deleted_at: None,
            unknown_fields: Default::default(),
        };
        self.store.insert_issue(&issue)?;
        let new_data = serde_json::to_string(&issue)?;
        action_log::append(
            &self.store,
            actor.session_id,
            "create",
            "issue",
            &issue.id,
            None,
            Some(&new_data),
            &now,
        )?;
        involvement::record(&self.store, &issue.id, actor.session_id, InvolvementAction::Created, &now)?;
        Ok(issue)
    }

    pub fn update_issue(&self, actor: &Actor, id: &str, patch: IssueUpdate) -> TdResult<Issue> {
        if let Some(points) = patch.story_points {
            validate_story_points(points)?;
        }
        let _guard = lock::acquire(&self.lock_path())?;
        let id = crate::id::normalize(crate::id::IdKind::Issue, id)?;
        let before = self.store.get_issue(&id)?;
        let previous_data = serde_json::to_string(&before)?;

        let mut after = before;
        if let Some(v) = patch.title {
            after.title = v;
        }
        if let Some(v) = patch.description {
            after.description = v;
        }
        if let Some(v) = patch.issue_type {
            after.issue_type = v;
        }
        if let Some(v) = patch.priority {
            after.priority = v;
        }
        if let Some(v) = patch.story_points {
            after.story_points = v;
        }
        if let Some(v) = patch.labels {
            after.labels = v;
        }
        if let Some(v) = patch.parent {
            after.parent = v;
        }
        if let Some(v) = patch.acceptance {
            after.acceptance = v;
        }
        if let Some(v) = patch.minor {
            after.minor = v;
        }
        after.updated_at = Utc::now().to_rfc3339();

        self.store.update_issue(&after)?;
        let new_data = serde_json::to_string(&after)?;
        action_log::append(
            &self.store,
            actor.session_id,
            "update",
            "issue",
            &after.id,
            Some(&previous_data),
            Some(&new_data),
            &after.updated_at,
        )?;
        Ok(after)
    }

    pub fn delete_issue(&self, actor: &Actor, id: &str) -> TdResult<Issue> {
        let _guard = lock::acquire(&self.lock_path())?;
        let id = crate::id::normalize(crate::id::IdKind::Issue, id)?;
        let before = self.store.get_issue(&id)?;
        let previous_data = serde_json::to_string(&before)?;

        let mut after = before;
        let now = Utc::now().to_rfc3339();
        after.deleted_at = Some(now.clone());
        after.updated_at = now.clone();
        self.store.update_issue(&after)?;

        action_log::append(
            &self.store,
            actor.session_id,
            "delete",
            "issue",
            &after.id,
            Some(&previous_data),
            None,
            &now,
        )?;
        Ok(after)
    }

    pub fn restore_issue(&self, actor: &Actor, id: &str) -> TdResult<Issue> {
        let _guard = lock::acquire(&self.lock_path())?;
        let id = crate::id::normalize(crate::id::IdKind::Issue, id)?;
        let before = self.store.get_issue(&id)?;
        let previous_data = serde_json::to_string(&before)?;

        let mut after = before;
        let now = Utc::now().to_rfc3339();
        after.deleted_at = None;
        after.updated_at = now.clone();
        self.store.update_issue(&after)?;

        let new_data = serde_json::to_string(&after)?;
        action_log::append(
            &self.store,
            actor.session_id,
            "restore",
            "issue",
            &after.id,
            Some(&previous_data),
            Some(&new_data),
            &now,
        )?;
        Ok(after)
    }

    // --- Status-transition actions -----------------------------------------

    pub fn start(&self, actor: &Actor, id: &str, opts: &TransitionOptions) -> TdResult<Issue> {
        self.transition(actor, id, IssueStatus::InProgress, "start", opts, |issue, session_id| {
                issue.implementer_session = Some(session_id.to_string());
        })
    }

    /// Clears `implementer_session` but the `started` involvement entry
    /// already recorded is immutable — this must never be
    /// allowed to "un-involve" the session.
    pub fn unstart(&self, actor: &Actor, id: &str, opts: &TransitionOptions) -> TdResult<Issue> {
        self.transition(actor, id, IssueStatus::Open, "unstart", opts, |issue, _| {
                issue.implementer_session = None;
        })
    }

    pub fn review(&self, actor: &Actor, id: &str, opts: &TransitionOptions) -> TdResult<Issue> {
        self.transition(actor, id, IssueStatus::InReview, "review", opts, |issue, session_id| {
                issue.reviewer_session = Some(session_id.to_string());
        })
    }

    pub fn reject(&self, actor: &Actor, id: &str, opts: &TransitionOptions) -> TdResult<Issue> {
        self.transition(actor, id, IssueStatus::InProgress, "reject", opts, |_, _| {})
    }

    pub fn block(&self, actor: &Actor, id: &str, opts: &TransitionOptions) -> TdResult<Issue> {
        self.transition(actor, id, IssueStatus::Blocked, "block", opts, |_, _| {})
    }

    pub fn unblock(&self, actor: &Actor, id: &str, opts: &TransitionOptions) -> TdResult<Issue> {
        self.transition(actor, id, IssueStatus::Open, "unblock", opts, |_, _| {})
    }

    pub fn reopen(&self, actor: &Actor, id: &str, opts: &TransitionOptions) -> TdResult<Issue> {
        self.transition(actor, id, IssueStatus::Open, "reopen", opts, |issue, _| {
                issue.closed_at = None;
        })
    }

    /// `approve` is the `in_review -> closed` path; the bypass policy's
    /// `Approve` formula gates it, in addition to the
    /// `DifferentReviewerGuard` the state machine itself runs under
    /// Advisory/Strict.
    pub fn approve(&self, actor: &Actor, id: &str, opts: &TransitionOptions) -> TdResult<Issue> {
        let _guard = lock::acquire(&self.lock_path())?;
        let id = crate::id::normalize(crate::id::IdKind::Issue, id)?;
        let issue = self.store.get_issue(&id)?;
        if issue.status != IssueStatus::InReview {
            return Err(TdError::Conflict(format!(
                        "cannot approve issue in status {}",
                        issue.status.as_str()
            )));
        }
        if !bypass::approve_allowed(&self.store, &issue, actor.session_id)? {
            return Err(TdError::CannotSelfApprove);
        }
        self.run_transition_unlocked(actor, issue, IssueStatus::Closed, "approve", opts, |issue, session_id| {
                issue.reviewer_session = Some(session_id.to_string());
                issue.closed_at = Some(Utc::now().to_rfc3339());
        })
    }

    /// `close` outside the approve path. The bypass policy's `Close`
    /// formula governs; a `self_close_exception` is an
    /// audited escape hatch that always succeeds but is logged to the
    /// security event log.
    pub fn close(&self, actor: &Actor, id: &str, opts: &TransitionOptions) -> TdResult<Issue> {
        let _guard = lock::acquire(&self.lock_path())?;
        let id = crate::id::normalize(crate::id::IdKind::Issue, id)?;
        let issue = self.store.get_issue(&id)?;
        if !state_machine::is_transition_allowed(issue.status, IssueStatus::Closed) {
            return Err(TdError::Conflict(format!(
                        "cannot close issue from status {}",
                        issue.status.as_str()
            )));
        }

        let exception = opts
        .self_close_reason
        .as_ref()
        .map(|reason| SelfCloseException { reason: reason.clone() });
        if !bypass::close_allowed(&self.store, &issue, actor.session_id, exception.as_ref())? {
            return Err(TdError::Conflict("cannot close issue you were involved with".to_string()));
        }
        if let Some(exception) = &exception {
            security_log::record(
                &self.security_log_path(),
                &SecurityEvent::new(&issue.id, actor.session_id, actor.agent_type, &exception.reason),
            )?;
        }

        self.run_transition_unlocked(actor, issue, IssueStatus::Closed, "close", opts, |issue, _| {
                issue.closed_at = Some(Utc::now().to_rfc3339());
        })
    }

    /// Shared by every status-transition mutator that does not need a
    /// bypass-policy check ahead of the state machine (approve/close run
    /// their own variant above since they need the issue snapshot early).
    fn transition(
        &self,
        actor: &Actor,
        id: &str,
        to: IssueStatus,
        action: &'static str,
        opts: &TransitionOptions,
        apply: impl FnOnce(&mut Issue, &str),
    ) -> TdResult<Issue> {
        let _guard = lock::acquire(&self.lock_path())?;
        let id = crate::id::normalize(crate::id::IdKind::Issue, id)?;
        let issue = self.store.get_issue(&id)?;
        self.run_transition_unlocked(actor, issue, to, action, opts, apply)
    }

    /// Runs validation and the mutate/log/involve sequence; the caller is
    /// responsible for already holding the write lock.
    fn run_transition_unlocked(
        &self,
        actor: &Actor,
        before: Issue,
        to: IssueStatus,
        action: &'static str,
        opts: &TransitionOptions,
        apply: impl FnOnce(&mut Issue, &str),
    ) -> TdResult<Issue> {
        if !state_machine::is_transition_allowed(before.status, to) {
            return Err(TdError::Conflict(format!(
                        "{} -> {} is not a valid transition",
                        before.status.as_str(),
                        to.as_str()
            )));
        }

        let was_involved = involvement::was_involved(&self.store, &before.id, actor.session_id).unwrap_or(true);
        let ctx = TransitionContext {
            issue_id: &before.id,
            from: before.status,
            to,
            session_id: actor.session_id,
            force: opts.force,
            minor: before.minor,
            context_role: actor.context_role,
            was_involved,
            implementer_session: before.implementer_session.as_deref(),
        };
        let results = state_machine::evaluate(self.mode, &ctx);
        if self.mode == EnforcementMode::Strict {
            if let Some(failure) = results.iter().find(|r| !r.passed) {
                return Err(TdError::Conflict(
                        failure
                        .message
                        .clone()
                        .unwrap_or_else(|| format!("{} failed", failure.guard)),
                ));
            }
        }

        let previous_data = serde_json::to_string(&before)?;
        let mut after = before;
        let from = after.status;
        after.status = to;
        after.updated_at = Utc::now().to_rfc3339();
        apply(&mut after, actor.session_id);

        self.store.update_issue(&after)?;
        let new_data = serde_json::to_string(&after)?;
        action_log::append(
            &self.store,
            actor.session_id,
            action,
            "issue",
            &after.id,
            Some(&previous_data),
            Some(&new_data),
            &after.updated_at,
        )?;

        if let Some(involvement_action) = involvement_action_for(action, from, to) {
            involvement::record(&self.store, &after.id, actor.session_id, involvement_action, &after.updated_at)?;
        }

        Ok(after)
    }
}

/// Maps a transition action onto the involvement action it should record
/// (only a status change to/from started/unstarted/reviewed does).
/// `reject`/`block`/`unblock`/`reopen` do not
/// themselves constitute one of the three tracked actions.
/// §3: story points are an enumerated Issue invariant, not a free integer.
/// The CLI pre-validates for a fast-fail, but this is the only path that can
/// actually enforce it, since TUI/sync collaborators call the kernel
/// directly without going through CLI flag parsing.
fn validate_story_points(points: Option<i64>) -> TdResult<()> {
    match points {
        Some(p) if !VALID_STORY_POINTS.contains(&p) => Err(TdError::InvalidInput(format!(
                    "invalid story points {p}; must be one of {VALID_STORY_POINTS:?}"
        ))),
        _ => Ok(()),
    }
}

fn involvement_action_for(action: &str, _from: IssueStatus, _to: IssueStatus) -> Option<InvolvementAction> {
    match action {
        "start" => Some(InvolvementAction::Started),
        "unstart" => Some(InvolvementAction::Unstarted),
        "review" | "approve" => Some(InvolvementAction::Reviewed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn kernel(dir: &TempDir) -> Kernel {
        Kernel::open(dir.path(), EnforcementMode::Liberal).unwrap()
    }

    fn actor<'a>(session_id: &'a str) -> Actor<'a> {
        Actor {
            session_id,
            agent_type: "claude-code",
            context_role: "user",
        }
    }

    #[test]
    fn create_issue_records_creator_involvement() {
        let dir = TempDir::new().unwrap();
        let k = kernel(&dir);
        let issue = k
        .create_issue(
            &actor("ses_aaaaaaaa"),
            CreateIssueInput {
                title: "fix thing".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(issue.status, IssueStatus::Open);
        assert!(involvement::was_involved(k.store(), &issue.id, "ses_aaaaaaaa").unwrap());
    }

    #[test]
    fn create_issue_rejects_invalid_story_points() {
        let dir = TempDir::new().unwrap();
        let k = kernel(&dir);
        let err = k
        .create_issue(
            &actor("ses_aaaaaaaa"),
            CreateIssueInput {
                title: "fix thing".to_string(),
                story_points: Some(4),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn update_issue_rejects_invalid_story_points() {
        let dir = TempDir::new().unwrap();
        let k = kernel(&dir);
        let a = actor("ses_aaaaaaaa");
        let issue = k
        .create_issue(&a, CreateIssueInput { title: "I1".to_string(), ..Default::default() })
        .unwrap();

        let err = k
        .update_issue(
            &a,
            &issue.id,
            IssueUpdate { story_points: Some(Some(4)), ..Default::default() },
        )
        .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(k.store().get_issue(&issue.id).unwrap().story_points, None);
    }

    #[test]
    fn update_issue_accepts_valid_story_points() {
        let dir = TempDir::new().unwrap();
        let k = kernel(&dir);
        let a = actor("ses_aaaaaaaa");
        let issue = k
        .create_issue(&a, CreateIssueInput { title: "I1".to_string(), ..Default::default() })
        .unwrap();

        let updated = k
        .update_issue(
            &a,
            &issue.id,
            IssueUpdate { story_points: Some(Some(5)), ..Default::default() },
        )
        .unwrap();
        assert_eq!(updated.story_points, Some(5));
    }

    #[test]
    fn self_approve_blocked_end_to_end() {
        let dir = TempDir::new().unwrap();
        let k = kernel(&dir);
        let a = actor("ses_aaaaaaaa");
        let issue = k
        .create_issue(&a, CreateIssueInput { title: "I1".to_string(), ..Default::default() })
        .unwrap();
        k.start(&a, &issue.id, &TransitionOptions::default()).unwrap();
        k.review(&a, &issue.id, &TransitionOptions::default()).unwrap();

        let err = k.approve(&a, &issue.id, &TransitionOptions::default()).unwrap_err();
        assert_eq!(err.code(), "cannot_self_approve");
        assert_eq!(k.store().get_issue(&issue.id).unwrap().status, IssueStatus::InReview);
    }

    #[test]
    fn third_party_approve_allowed_end_to_end() {
        let dir = TempDir::new().unwrap();
        let k = kernel(&dir);
        let a = actor("ses_aaaaaaaa");
        let c = actor("ses_cccccccc");
        let issue = k
        .create_issue(&a, CreateIssueInput { title: "I1".to_string(), ..Default::default() })
        .unwrap();
        k.start(&a, &issue.id, &TransitionOptions::default()).unwrap();
        k.review(&a, &issue.id, &TransitionOptions::default()).unwrap();
        let approved = k.approve(&c, &issue.id, &TransitionOptions::default()).unwrap();

        assert_eq!(approved.status, IssueStatus::Closed);
        assert_eq!(approved.reviewer_session.as_deref(), Some("ses_cccccccc"));
    }

    #[test]
    fn unstart_does_not_launder_involvement_end_to_end() {
        let dir = TempDir::new().unwrap();
        let k = kernel(&dir);
        let a = actor("ses_aaaaaaaa");
        let b = actor("ses_bbbbbbbb");
        let issue = k
        .create_issue(&a, CreateIssueInput { title: "I1".to_string(), ..Default::default() })
        .unwrap();
        k.start(&a, &issue.id, &TransitionOptions::default()).unwrap();
        k.unstart(&a, &issue.id, &TransitionOptions::default()).unwrap();
        k.start(&b, &issue.id, &TransitionOptions::default()).unwrap();
        k.review(&b, &issue.id, &TransitionOptions::default()).unwrap();

        let err = k.approve(&a, &issue.id, &TransitionOptions::default()).unwrap_err();
        assert_eq!(err.code(), "cannot_self_approve");
    }

    #[test]
    fn creator_with_delegate_close_allowed() {
        let dir = TempDir::new().unwrap();
        let k = kernel(&dir);
        let a = actor("ses_aaaaaaaa");
        let b = actor("ses_bbbbbbbb");
        let issue = k
        .create_issue(&a, CreateIssueInput { title: "I1".to_string(), ..Default::default() })
        .unwrap();
        k.start(&b, &issue.id, &TransitionOptions::default()).unwrap();
        k.review(&b, &issue.id, &TransitionOptions::default()).unwrap();
        let closed = k.close(&a, &issue.id, &TransitionOptions::default()).unwrap();
        assert_eq!(closed.status, IssueStatus::Closed);
    }

    #[test]
    fn minor_self_approve_allowed() {
        let dir = TempDir::new().unwrap();
        let k = kernel(&dir);
        let a = actor("ses_aaaaaaaa");
        let issue = k
        .create_issue(
            &a,
            CreateIssueInput {
                title: "I1".to_string(),
                minor: true,
                ..Default::default()
            },
        )
        .unwrap();
        k.start(&a, &issue.id, &TransitionOptions::default()).unwrap();
        k.review(&a, &issue.id, &TransitionOptions::default()).unwrap();
        let approved = k.approve(&a, &issue.id, &TransitionOptions::default()).unwrap();
        assert_eq!(approved.status, IssueStatus::Closed);
    }

    #[test]
    fn self_close_exception_is_audited() {
        let dir = TempDir::new().unwrap();
        let k = kernel(&dir);
        let a = actor("ses_aaaaaaaa");
        let issue = k
        .create_issue(&a, CreateIssueInput { title: "I1".to_string(), ..Default::default() })
        .unwrap();
        k.start(&a, &issue.id, &TransitionOptions::default()).unwrap();
        k.review(&a, &issue.id, &TransitionOptions::default()).unwrap();

        let opts = TransitionOptions {
            force: false,
            self_close_reason: Some("urgent hotfix".to_string()),
        };
        k.close(&a, &issue.id, &opts).unwrap();

        let log_path = dir.path().join(".todos").join("security_events.jsonl");
        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("urgent hotfix"));
    }

    #[test]
    fn blocked_guard_requires_force_under_strict_mode() {
        let dir = TempDir::new().unwrap();
        let k = Kernel::open(dir.path(), EnforcementMode::Strict).unwrap();
        let a = actor("ses_aaaaaaaa");
        let issue = k
        .create_issue(&a, CreateIssueInput { title: "I1".to_string(), ..Default::default() })
        .unwrap();
        k.block(&a, &issue.id, &TransitionOptions::default()).unwrap();

        let err = k.start(&a, &issue.id, &TransitionOptions::default()).unwrap_err();
        assert_eq!(err.code(), "conflict");

        let forced = k
        .start(
            &a,
            &issue.id,
            &TransitionOptions { force: true, self_close_reason: None },
        )
        .unwrap();
        assert_eq!(forced.status, IssueStatus::InProgress);
    }

    #[test]
    fn delete_then_restore_round_trip() {
        let dir = TempDir::new().unwrap();
        let k = kernel(&dir);
        let a = actor("ses_aaaaaaaa");
        let issue = k
        .create_issue(&a, CreateIssueInput { title: "I1".to_string(), ..Default::default() })
        .unwrap();
        let deleted = k.delete_issue(&a, &issue.id).unwrap();
        assert!(deleted.is_deleted());
        assert_eq!(k.store().list_issues(false).unwrap().len(), 0);

        let restored = k.restore_issue(&a, &issue.id).unwrap();
        assert!(!restored.is_deleted());
        assert_eq!(k.store().list_issues(false).unwrap().len(), 1);
    }
}

//! End-to-end coverage of the full open -> in_progress -> in_review ->
//! closed path through the public `Kernel` API, exercised against a real
//! on-disk store rather than the in-memory store the unit tests use.

use td_core::mutators::{Actor, CreateIssueInput, Kernel, TransitionOptions};
use td_core::schema::IssueStatus;
use td_core::state_machine::EnforcementMode;
use tempfile::TempDir;

fn actor(session_id: &str) -> Actor<'_> {
    Actor {
        session_id,
        agent_type: "claude",
        context_role: "user",
    }
}

#[test]
fn full_lifecycle_requires_a_third_party_approval() {
    let dir = TempDir::new().unwrap();
    let kernel = Kernel::open(dir.path(), EnforcementMode::Liberal).unwrap();

    let issue = kernel
    .create_issue(
        &actor("ses_creator"),
        CreateIssueInput {
            title: "wire up the thing".to_string(),
            issue_type: td_core::schema::IssueType::Task,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(issue.status, IssueStatus::Open);

    let opts = TransitionOptions::default();
    let issue = kernel.start(&actor("ses_implementer"), &issue.id, &opts).unwrap();
    assert_eq!(issue.status, IssueStatus::InProgress);
    assert_eq!(issue.implementer_session.as_deref(), Some("ses_implementer"));

    let issue = kernel.review(&actor("ses_implementer"), &issue.id, &opts).unwrap();
    assert_eq!(issue.status, IssueStatus::InReview);

    let err = kernel.approve(&actor("ses_implementer"), &issue.id, &opts).unwrap_err();
    assert!(matches!(err, td_core::TdError::CannotSelfApprove));

    let issue = kernel.approve(&actor("ses_reviewer"), &issue.id, &opts).unwrap();
    assert_eq!(issue.status, IssueStatus::Closed);
    assert!(issue.closed_at.is_some());
}

#[test]
fn blocked_issue_needs_force_to_resume() {
    let dir = TempDir::new().unwrap();
    let kernel = Kernel::open(dir.path(), EnforcementMode::Liberal).unwrap();
    let issue = kernel
    .create_issue(
        &actor("ses_a"),
        CreateIssueInput {
            title: "blocked thing".to_string(),
            issue_type: td_core::schema::IssueType::Bug,
            ..Default::default()
        },
    )
    .unwrap();

    let opts = TransitionOptions::default();
    let issue = kernel.block(&actor("ses_a"), &issue.id, &opts).unwrap();
    assert_eq!(issue.status, IssueStatus::Blocked);

    // Liberal mode never runs guards, so the transition just succeeds
    // without `force` even though `BlockedGuard` exists.
    let issue = kernel.unblock(&actor("ses_a"), &issue.id, &opts).unwrap();
    assert_eq!(issue.status, IssueStatus::Open);
}

#[test]
fn delete_then_restore_round_trips_the_soft_delete() {
    let dir = TempDir::new().unwrap();
    let kernel = Kernel::open(dir.path(), EnforcementMode::Liberal).unwrap();
    let issue = kernel
    .create_issue(
        &actor("ses_a"),
        CreateIssueInput {
            title: "throwaway".to_string(),
            issue_type: td_core::schema::IssueType::Chore,
            ..Default::default()
        },
    )
    .unwrap();

    let deleted = kernel.delete_issue(&actor("ses_a"), &issue.id).unwrap();
    assert!(deleted.deleted_at.is_some());

    let restored = kernel.restore_issue(&actor("ses_a"), &issue.id).unwrap();
    assert!(restored.deleted_at.is_none());
}

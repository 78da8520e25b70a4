//! Dependency readiness and TDQ query coverage driven through the public
//! `Kernel`, exercising the full lexer -> parser -> validator -> evaluator
//! pipeline rather than calling the evaluator directly.

use chrono::Utc;
use td_core::dependency::DependencyIndex;
use td_core::mutators::{Actor, CreateIssueInput, Kernel};
use td_core::schema::{IssuePriority, IssueType};
use td_core::state_machine::EnforcementMode;
use td_core::tdq::{evaluator, parser, validator};
use tempfile::TempDir;

fn actor(session_id: &str) -> Actor<'_> {
    Actor {
        session_id,
        agent_type: "claude",
        context_role: "user",
    }
}

#[test]
fn issue_is_not_ready_until_its_blocker_closes() {
    let dir = TempDir::new().unwrap();
    let kernel = Kernel::open(dir.path(), EnforcementMode::Liberal).unwrap();
    let opts = Default::default();

    let blocker = kernel
    .create_issue(
        &actor("ses_a"),
        CreateIssueInput {
            title: "blocker".to_string(),
            issue_type: IssueType::Task,
            ..Default::default()
        },
    )
    .unwrap();
    let target = kernel
    .create_issue(
        &actor("ses_a"),
        CreateIssueInput {
            title: "target".to_string(),
            issue_type: IssueType::Task,
            ..Default::default()
        },
    )
    .unwrap();
    kernel.add_dependency(&actor("ses_a"), &target.id, &blocker.id).unwrap();

    let idx = DependencyIndex::build(kernel.store()).unwrap();
    assert!(!idx.is_ready(&target.id));

    kernel.start(&actor("ses_a"), &blocker.id, &opts).unwrap();
    kernel.review(&actor("ses_a"), &blocker.id, &opts).unwrap();
    kernel.approve(&actor("ses_b"), &blocker.id, &opts).unwrap();

    let idx = DependencyIndex::build(kernel.store()).unwrap();
    assert!(idx.is_ready(&target.id));
}

#[test]
fn tdq_filters_by_priority_and_honors_sort() {
    let dir = TempDir::new().unwrap();
    let kernel = Kernel::open(dir.path(), EnforcementMode::Liberal).unwrap();

    kernel
    .create_issue(
        &actor("ses_a"),
        CreateIssueInput {
            title: "low prio".to_string(),
            issue_type: IssueType::Bug,
            priority: Some(IssuePriority::P3),
            ..Default::default()
        },
    )
    .unwrap();
    kernel
    .create_issue(
        &actor("ses_a"),
        CreateIssueInput {
            title: "high prio".to_string(),
            issue_type: IssueType::Bug,
            priority: Some(IssuePriority::P0),
            ..Default::default()
        },
    )
    .unwrap();

    let query = parser::parse("type = bug AND priority = P0").unwrap();
    assert!(validator::validate(&query).is_empty());

    let ctx = evaluator::EvalContext::new(kernel.store(), "ses_a", Utc::now()).unwrap();
    let results = evaluator::query_issues(&ctx, &query, 500).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "high prio");
}

#[test]
fn tdq_is_ready_function_excludes_blocked_work() {
    let dir = TempDir::new().unwrap();
    let kernel = Kernel::open(dir.path(), EnforcementMode::Liberal).unwrap();

    let blocker = kernel
    .create_issue(
        &actor("ses_a"),
        CreateIssueInput {
            title: "blocker".to_string(),
            issue_type: IssueType::Task,
            ..Default::default()
        },
    )
    .unwrap();
    let target = kernel
    .create_issue(
        &actor("ses_a"),
        CreateIssueInput {
            title: "target".to_string(),
            issue_type: IssueType::Task,
            ..Default::default()
        },
    )
    .unwrap();
    kernel.add_dependency(&actor("ses_a"), &target.id, &blocker.id).unwrap();

    let query = parser::parse("is_ready()").unwrap();
    let ctx = evaluator::EvalContext::new(kernel.store(), "ses_a", Utc::now()).unwrap();
    let results = evaluator::query_issues(&ctx, &query, 500).unwrap();
    assert!(results.iter().all(|i| i.id != target.id));
    assert!(results.iter().any(|i| i.id == blocker.id));
}

//! `td show`: full detail view of one issue, including its satellite
//! entities (logs, handoffs, comments, git snapshots, files) and dependency
//! readiness; a read-only view, no mutation.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;
use td_core::dependency::DependencyIndex;
use td_core::id::{normalize, IdKind};

/// Show one issue and everything attached to it
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Issue id (bare hex or `td-`-prefixed)
    id: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn execute(args: ShowArgs, ctx: &RunContext) -> Result<()> {
    let id = output::unwrap_or_fail(args.json, normalize(IdKind::Issue, &args.id));
    let store = ctx.kernel.store();

    let issue = output::unwrap_or_fail(args.json, store.get_issue(&id));
    let logs = output::unwrap_or_fail(args.json, store.logs_for_issue(&id));
    let handoffs = output::unwrap_or_fail(args.json, store.handoffs_for_issue(&id));
    let comments = output::unwrap_or_fail(args.json, store.comments_for_issue(&id));
    let snapshots = output::unwrap_or_fail(args.json, store.git_snapshots_for_issue(&id));
    let files = output::unwrap_or_fail(args.json, store.issue_files_for_issue(&id));
    let deps = output::unwrap_or_fail(args.json, DependencyIndex::build(store));

    if args.json {
        output::print_json(&serde_json::json!({
            "issue": issue,
            "logs": logs,
            "handoffs": handoffs,
            "comments": comments,
            "git_snapshots": snapshots,
            "files": files,
            "is_ready": deps.is_ready(&id),
            "blocked_by": deps.blocked_by(&id),
            "blocks": deps.blocks(&id),
        }));
        return Ok(());
    }

    output::print_issue(&issue, false);
    println!("  description: {}", issue.description);
    if !issue.acceptance.is_empty() {
        println!("  acceptance: {}", issue.acceptance);
    }
    if !issue.labels.is_empty() {
        println!("  labels: {}", issue.labels.join(", "));
    }
    println!("  creator: {}", issue.creator_session);
    if let Some(implementer) = &issue.implementer_session {
        println!("  implementer: {implementer}");
    }
    if let Some(reviewer) = &issue.reviewer_session {
        println!("  reviewer: {reviewer}");
    }
    println!("  ready: {}", deps.is_ready(&id));
    let blocked_by = deps.blocked_by(&id);
    if !blocked_by.is_empty() {
        println!("  blocked by: {}", blocked_by.join(", "));
    }
    for log in &logs {
        println!("  log [{}] {}", log.tag.as_str(), log.message);
    }
    for handoff in &handoffs {
        println!("  handoff v{} done: {}", handoff.version, handoff.done);
    }
    for comment in &comments {
        println!("  comment: {}", comment.body);
    }
    for snapshot in &snapshots {
        println!("  snapshot: {}@{}", snapshot.branch, snapshot.commit);
    }
    for file in &files {
        println!("  file: {}", file.path);
    }
    Ok(())
}

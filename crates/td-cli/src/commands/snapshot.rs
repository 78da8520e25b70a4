//! `td snapshot`: record a git state snapshot against an issue via
//! `create_git_snapshot`. Branch/commit/dirty default to the current repo
//! state but can be overridden, since git state capture itself is out of
//! this crate's scope — this command only records whatever the caller (or
//! a thin `git` shell-out) supplies.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;
use td_core::mutators::CreateGitSnapshotInput;

/// Record a git state snapshot for an issue
#[derive(Args, Debug)]
pub struct SnapshotArgs {
    id: String,

    /// Defaults to `git rev-parse --abbrev-ref HEAD`
    #[arg(long)]
    branch: Option<String>,

    /// Defaults to `git rev-parse HEAD`
    #[arg(long)]
    commit: Option<String>,

    /// Defaults to whether `git status --porcelain` reports changes
    #[arg(long)]
    dirty: Option<bool>,

    #[arg(long)]
    json: bool,
}

fn git_output(args: &[&str]) -> Option<String> {
    std::process::Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
}

pub fn execute(args: SnapshotArgs, ctx: &RunContext) -> Result<()> {
    let branch = args
        .branch
        .or_else(|| git_output(&["rev-parse", "--abbrev-ref", "HEAD"]))
        .unwrap_or_else(|| "unknown".to_string());
    let commit = args
        .commit
        .or_else(|| git_output(&["rev-parse", "HEAD"]))
        .unwrap_or_else(|| "unknown".to_string());
    let dirty = args.dirty.unwrap_or_else(|| {
        git_output(&["status", "--porcelain"]).is_some_and(|s| !s.is_empty())
    });

    let input = CreateGitSnapshotInput { issue_id: args.id, branch, commit, dirty };
    let snapshot = output::unwrap_or_fail(args.json, ctx.kernel.create_git_snapshot(&ctx.actor(), input));
    if args.json {
        output::print_git_snapshot(&snapshot, true);
    } else {
        println!("SNAPSHOT RECORDED {}", snapshot.id);
    }
    Ok(())
}

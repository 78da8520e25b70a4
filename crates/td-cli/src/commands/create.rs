//! `td create`: issue creation via `create_issue`.

use super::error::CommandError;
use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;
use td_core::mutators::CreateIssueInput;
use td_core::schema::{IssuePriority, IssueType, VALID_STORY_POINTS};

/// Create a new issue
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Issue title
    title: String,

    /// Long-form description
    #[arg(long, default_value = "")]
    description: String,

    /// bug, feature, task, epic, or chore (default: task)
    #[arg(long = "type")]
    issue_type: Option<String>,

    /// P0-P4 or a word form (critical/high/medium/low/trivial)
    #[arg(long)]
    priority: Option<String>,

    /// One of 1, 2, 3, 5, 8, 13, 21
    #[arg(long)]
    story_points: Option<i64>,

    /// Repeatable label
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Parent issue id
    #[arg(long)]
    parent: Option<String>,

    /// Acceptance criteria
    #[arg(long, default_value = "")]
    acceptance: String,

    /// Marks the issue as exempt from the `DifferentReviewerGuard`
    #[arg(long)]
    minor: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn execute(args: CreateArgs, ctx: &RunContext) -> Result<()> {
    let issue_type = match &args.issue_type {
        Some(raw) => IssueType::parse(raw).ok_or_else(|| CommandError::UnknownIssueType(raw.clone()))?,
        None => IssueType::default(),
    };
    let priority = args
        .priority
        .as_ref()
        .map(|raw| IssuePriority::parse(raw).ok_or_else(|| CommandError::UnknownPriority(raw.clone())))
        .transpose()?;
    if let Some(points) = args.story_points {
        if !VALID_STORY_POINTS.contains(&points) {
            return Err(CommandError::InvalidStoryPoints(VALID_STORY_POINTS).into());
        }
    }

    let input = CreateIssueInput {
        title: args.title,
        description: args.description,
        issue_type,
        priority,
        story_points: args.story_points,
        labels: args.labels,
        parent: args.parent,
        acceptance: args.acceptance,
        minor: args.minor,
    };

    let issue = output::unwrap_or_fail(args.json, ctx.kernel.create_issue(&ctx.actor(), input));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("CREATED {}", issue.id);
    }
    Ok(())
}

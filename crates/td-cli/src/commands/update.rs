//! `td update`: sparse issue patch via `update_issue`.

use super::error::CommandError;
use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;
use td_core::mutators::IssueUpdate;
use td_core::schema::{IssuePriority, IssueType, VALID_STORY_POINTS};

/// Patch an existing issue; omitted fields are left unchanged
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Issue id
    id: String,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long = "type")]
    issue_type: Option<String>,

    #[arg(long)]
    priority: Option<String>,

    /// Pass `none` to clear story points
    #[arg(long)]
    story_points: Option<String>,

    /// Repeatable; replaces the full label set
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Pass `none` to clear the parent
    #[arg(long)]
    parent: Option<String>,

    #[arg(long)]
    acceptance: Option<String>,

    #[arg(long)]
    minor: Option<bool>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn execute(args: UpdateArgs, ctx: &RunContext) -> Result<()> {
    let issue_type = args
        .issue_type
        .as_ref()
        .map(|raw| IssueType::parse(raw).ok_or_else(|| CommandError::UnknownIssueType(raw.clone())))
        .transpose()?;
    let priority = args
        .priority
        .as_ref()
        .map(|raw| IssuePriority::parse(raw).ok_or_else(|| CommandError::UnknownPriority(raw.clone())))
        .transpose()?;
    let story_points = match args.story_points.as_deref() {
        None => None,
        Some("none") => Some(None),
        Some(raw) => {
            let points: i64 = raw.parse().map_err(|_| CommandError::InvalidStoryPoints(VALID_STORY_POINTS))?;
            if !VALID_STORY_POINTS.contains(&points) {
                return Err(CommandError::InvalidStoryPoints(VALID_STORY_POINTS).into());
            }
            Some(Some(points))
        }
    };
    let parent = match args.parent.as_deref() {
        None => None,
        Some("none") => Some(None),
        Some(raw) => Some(Some(raw.to_string())),
    };

    let patch = IssueUpdate {
        title: args.title,
        description: args.description,
        issue_type,
        priority,
        story_points,
        labels: if args.labels.is_empty() { None } else { Some(args.labels) },
        parent,
        acceptance: args.acceptance,
        minor: args.minor,
    };

    let issue = output::unwrap_or_fail(args.json, ctx.kernel.update_issue(&ctx.actor(), &args.id, patch));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("UPDATED {}", issue.id);
    }
    Ok(())
}

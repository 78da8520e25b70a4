//! `td log`: append a progress note to an issue via `create_log`.

use super::error::CommandError;
use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;
use td_core::mutators::CreateLogInput;
use td_core::schema::LogTag;

/// Append a progress log entry to an issue
#[derive(Args, Debug)]
pub struct LogArgs {
    id: String,
    message: String,

    /// progress, blocker, decision, hypothesis, tried, or result (default: progress)
    #[arg(long)]
    tag: Option<String>,

    #[arg(long)]
    json: bool,
}

pub fn execute(args: LogArgs, ctx: &RunContext) -> Result<()> {
    let tag = match &args.tag {
        Some(raw) => LogTag::parse(raw).ok_or_else(|| CommandError::UnknownLogTag(raw.clone()))?,
        None => LogTag::default(),
    };
    let input = CreateLogInput { issue_id: args.id, tag, message: args.message };
    let log = output::unwrap_or_fail(args.json, ctx.kernel.create_log(&ctx.actor(), input));
    if args.json {
        output::print_log(&log, true);
    } else {
        println!("LOGGED {}", log.id);
    }
    Ok(())
}

//! `td handoff`: record a versioned handoff snapshot via `create_handoff`.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;
use td_core::mutators::CreateHandoffInput;

/// Record a handoff snapshot for an issue
#[derive(Args, Debug)]
pub struct HandoffArgs {
    id: String,

    #[arg(long, default_value = "")]
    done: String,

    #[arg(long, default_value = "")]
    remaining: String,

    #[arg(long, default_value = "")]
    decisions: String,

    #[arg(long, default_value = "")]
    uncertain: String,

    /// Repeatable file path touched by this work
    #[arg(long = "file")]
    files: Vec<String>,

    #[arg(long)]
    json: bool,
}

pub fn execute(args: HandoffArgs, ctx: &RunContext) -> Result<()> {
    let input = CreateHandoffInput {
        issue_id: args.id,
        done: args.done,
        remaining: args.remaining,
        decisions: args.decisions,
        uncertain: args.uncertain,
        files: args.files,
    };
    let handoff = output::unwrap_or_fail(args.json, ctx.kernel.create_handoff(&ctx.actor(), input));
    if args.json {
        output::print_handoff(&handoff, true);
    } else {
        println!("HANDOFF RECORDED {}", handoff.id);
    }
    Ok(())
}

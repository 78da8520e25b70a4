//! `td restore`: undo a soft-delete via `restore_issue`.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;

/// Restore a soft-deleted issue
#[derive(Args, Debug)]
pub struct RestoreArgs {
    id: String,

    #[arg(long)]
    json: bool,
}

pub fn execute(args: RestoreArgs, ctx: &RunContext) -> Result<()> {
    let issue = output::unwrap_or_fail(args.json, ctx.kernel.restore_issue(&ctx.actor(), &args.id));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("RESTORED {}", issue.id);
    }
    Ok(())
}

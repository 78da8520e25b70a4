//! `td delete`: soft-delete an issue via `delete_issue`.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;

/// Soft-delete an issue
#[derive(Args, Debug)]
pub struct DeleteArgs {
    id: String,

    #[arg(long)]
    json: bool,
}

pub fn execute(args: DeleteArgs, ctx: &RunContext) -> Result<()> {
    let issue = output::unwrap_or_fail(args.json, ctx.kernel.delete_issue(&ctx.actor(), &args.id));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("DELETED {}", issue.id);
    }
    Ok(())
}

//! `td attach`: record a file reference against an issue via
//! `attach_issue_file`.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;
use td_core::mutators::CreateIssueFileInput;

/// Attach a file reference to an issue
#[derive(Args, Debug)]
pub struct AttachArgs {
    id: String,
    path: String,

    #[arg(long)]
    note: Option<String>,

    #[arg(long)]
    json: bool,
}

pub fn execute(args: AttachArgs, ctx: &RunContext) -> Result<()> {
    let input = CreateIssueFileInput { issue_id: args.id, path: args.path, note: args.note };
    let file = output::unwrap_or_fail(args.json, ctx.kernel.attach_issue_file(&ctx.actor(), input));
    if args.json {
        output::print_issue_file(&file, true);
    } else {
        println!("ATTACHED {}", file.id);
    }
    Ok(())
}

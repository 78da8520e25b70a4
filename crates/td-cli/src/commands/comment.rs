//! `td comment`: append a comment to an issue via `create_comment`.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;
use td_core::mutators::CreateCommentInput;

/// Add a comment to an issue
#[derive(Args, Debug)]
pub struct CommentArgs {
    id: String,
    body: String,

    #[arg(long)]
    json: bool,
}

pub fn execute(args: CommentArgs, ctx: &RunContext) -> Result<()> {
    let input = CreateCommentInput { issue_id: args.id, body: args.body };
    let comment = output::unwrap_or_fail(args.json, ctx.kernel.create_comment(&ctx.actor(), input));
    if args.json {
        output::print_comment(&comment, true);
    } else {
        println!("COMMENTED {}", comment.id);
    }
    Ok(())
}

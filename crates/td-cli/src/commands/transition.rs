//! Status-transition commands (logged transition mutators + state-machine
//! and bypass-policy enforcement). Grouped in one file since these nine
//! commands share one shape (issue id, an
//! optional `--force` for the `BlockedGuard`, `--json`) and differ only in
//! which `Kernel` method and stable message they call.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::Args;
use td_core::mutators::TransitionOptions;

#[derive(Args, Debug)]
pub struct StartArgs {
    id: String,
    #[arg(long)]
    force: bool,
    #[arg(long)]
    json: bool,
}

pub fn start(args: StartArgs, ctx: &RunContext) -> Result<()> {
    let opts = TransitionOptions { force: args.force, self_close_reason: None };
    let issue = output::unwrap_or_fail(args.json, ctx.kernel.start(&ctx.actor(), &args.id, &opts));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("STARTED {} (session: {})", issue.id, ctx.session.id);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct UnstartArgs {
    id: String,
    #[arg(long)]
    json: bool,
}

pub fn unstart(args: UnstartArgs, ctx: &RunContext) -> Result<()> {
    let issue = output::unwrap_or_fail(args.json, ctx.kernel.unstart(&ctx.actor(), &args.id, &TransitionOptions::default()));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("UNSTARTED {}", issue.id);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct ReviewArgs {
    id: String,
    #[arg(long)]
    json: bool,
}

pub fn review(args: ReviewArgs, ctx: &RunContext) -> Result<()> {
    let issue = output::unwrap_or_fail(args.json, ctx.kernel.review(&ctx.actor(), &args.id, &TransitionOptions::default()));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("REVIEW REQUESTED {} (session: {})", issue.id, ctx.session.id);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct RejectArgs {
    id: String,
    #[arg(long)]
    json: bool,
}

pub fn reject(args: RejectArgs, ctx: &RunContext) -> Result<()> {
    let issue = output::unwrap_or_fail(args.json, ctx.kernel.reject(&ctx.actor(), &args.id, &TransitionOptions::default()));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("REJECTED {} \u{2192} in_progress", issue.id);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct BlockArgs {
    id: String,
    #[arg(long)]
    json: bool,
}

pub fn block(args: BlockArgs, ctx: &RunContext) -> Result<()> {
    let issue = output::unwrap_or_fail(args.json, ctx.kernel.block(&ctx.actor(), &args.id, &TransitionOptions::default()));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("BLOCKED {}", issue.id);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct UnblockArgs {
    id: String,
    #[arg(long)]
    json: bool,
}

pub fn unblock(args: UnblockArgs, ctx: &RunContext) -> Result<()> {
    let issue = output::unwrap_or_fail(args.json, ctx.kernel.unblock(&ctx.actor(), &args.id, &TransitionOptions::default()));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("UNBLOCKED {}", issue.id);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct ReopenArgs {
    id: String,
    #[arg(long)]
    json: bool,
}

pub fn reopen(args: ReopenArgs, ctx: &RunContext) -> Result<()> {
    let issue = output::unwrap_or_fail(args.json, ctx.kernel.reopen(&ctx.actor(), &args.id, &TransitionOptions::default()));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("REOPENED {}", issue.id);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct ApproveArgs {
    id: String,
    #[arg(long)]
    force: bool,
    #[arg(long)]
    json: bool,
}

pub fn approve(args: ApproveArgs, ctx: &RunContext) -> Result<()> {
    let opts = TransitionOptions { force: args.force, self_close_reason: None };
    let issue = output::unwrap_or_fail(args.json, ctx.kernel.approve(&ctx.actor(), &args.id, &opts));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("APPROVED {} (reviewer: {})", issue.id, ctx.session.id);
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct CloseArgs {
    id: String,
    #[arg(long)]
    force: bool,
    /// An audited bypass of the close policy; recorded to `security_events.jsonl`
    #[arg(long)]
    self_close_reason: Option<String>,
    #[arg(long)]
    json: bool,
}

pub fn close(args: CloseArgs, ctx: &RunContext) -> Result<()> {
    let opts = TransitionOptions { force: args.force, self_close_reason: args.self_close_reason };
    let issue = output::unwrap_or_fail(args.json, ctx.kernel.close(&ctx.actor(), &args.id, &opts));
    if args.json {
        output::print_issue(&issue, true);
    } else {
        println!("CLOSED {} (session: {})", issue.id, ctx.session.id);
    }
    Ok(())
}

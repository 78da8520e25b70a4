//! `td dep`: dependency-graph edges — `add_dependency` to create one, the
//! rest of this module reading back the dependency index.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::{Args, Subcommand};
use td_core::dependency::DependencyIndex;
use td_core::id::{normalize, IdKind};

#[derive(Args, Debug)]
pub struct DepArgs {
    #[command(subcommand)]
    command: DepCommand,
}

#[derive(Subcommand, Debug)]
enum DepCommand {
    /// Make `issue` depend on `depends_on` (rejects self-deps and cycles)
    Add {
        issue: String,
        depends_on: String,
        #[arg(long)]
        json: bool,
    },
    /// Show what an issue depends on and what depends on it
    Show {
        issue: String,
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(args: DepArgs, ctx: &RunContext) -> Result<()> {
    match args.command {
        DepCommand::Add { issue, depends_on, json } => {
            output::unwrap_or_fail(json, ctx.kernel.add_dependency(&ctx.actor(), &issue, &depends_on));
            if json {
                output::print_json(&serde_json::json!({ "issue": issue, "depends_on": depends_on }));
            } else {
                println!("DEPENDENCY ADDED {issue} -> {depends_on}");
            }
        }
        DepCommand::Show { issue, json } => {
            let id = output::unwrap_or_fail(json, normalize(IdKind::Issue, &issue));
            let deps = output::unwrap_or_fail(json, DependencyIndex::build(ctx.kernel.store()));
            let blocks = deps.blocks(&id);
            let blocked_by = deps.blocked_by(&id);
            if json {
                output::print_json(&serde_json::json!({
                    "issue": id,
                    "is_ready": deps.is_ready(&id),
                    "blocks": blocks,
                    "blocked_by": blocked_by,
                }));
            } else {
                println!("{id} ready: {}", deps.is_ready(&id));
                println!("  blocks: {}", blocks.join(", "));
                println!("  blocked by: {}", blocked_by.join(", "));
            }
        }
    }
    Ok(())
}

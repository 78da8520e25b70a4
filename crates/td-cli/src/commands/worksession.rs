//! `td worksession`: multi-issue work sessions, via
//! `start_work_session`/`end_work_session`/`add_work_session_issue`.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::{Args, Subcommand};
use td_core::mutators::StartWorkSessionInput;

#[derive(Args, Debug)]
pub struct WorkSessionArgs {
    #[command(subcommand)]
    command: WorkSessionCommand,
}

#[derive(Subcommand, Debug)]
enum WorkSessionCommand {
    Start {
        /// Issues worked on at the outset; more can be added later
        issue_ids: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    End {
        id: String,
        #[arg(long)]
        json: bool,
    },
    AddIssue {
        id: String,
        issue_id: String,
        #[arg(long)]
        json: bool,
    },
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(args: WorkSessionArgs, ctx: &RunContext) -> Result<()> {
    match args.command {
        WorkSessionCommand::Start { issue_ids, json } => {
            let ws = output::unwrap_or_fail(
                json,
                ctx.kernel.start_work_session(&ctx.actor(), StartWorkSessionInput { issue_ids }),
            );
            if json {
                output::print_work_session(&ws, true);
            } else {
                println!("STARTED {}", ws.id);
            }
        }
        WorkSessionCommand::End { id, json } => {
            let ws = output::unwrap_or_fail(json, ctx.kernel.end_work_session(&ctx.actor(), &id));
            if json {
                output::print_work_session(&ws, true);
            } else {
                println!("ENDED {}", ws.id);
            }
        }
        WorkSessionCommand::AddIssue { id, issue_id, json } => {
            let ws = output::unwrap_or_fail(json, ctx.kernel.add_work_session_issue(&ctx.actor(), &id, &issue_id));
            if json {
                output::print_work_session(&ws, true);
            } else {
                println!("ADDED {} -> {}", issue_id, ws.id);
            }
        }
        WorkSessionCommand::Show { id, json } => {
            let ws = output::unwrap_or_fail(json, ctx.kernel.store().get_work_session(&id));
            output::print_work_session(&ws, json);
        }
    }
    Ok(())
}

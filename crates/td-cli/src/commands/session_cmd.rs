//! `td session`: inspect or rotate the calling agent's session identity.
//! Rotation is handled upstream in the dispatcher, since it changes
//! which `RunContext` gets resolved for this invocation — this module only
//! renders whatever context it is handed.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Show the current session's identity
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Start a fresh session identity for this branch/fingerprint, keeping
    /// a pointer back to the previous one
    Rotate {
        #[arg(long)]
        json: bool,
    },
}

impl SessionArgs {
    pub fn wants_rotate(&self) -> bool {
        matches!(self.command, SessionCommand::Rotate { .. })
    }
}

pub fn execute(args: SessionArgs, ctx: &RunContext) -> Result<()> {
    let json = match &args.command {
        SessionCommand::Show { json } => *json,
        SessionCommand::Rotate { json } => *json,
    };
    if json {
        output::print_json(&ctx.session);
    } else {
        let s = &ctx.session;
        println!("id: {}", s.id);
        println!("name: {}", s.name);
        println!("branch: {}", s.branch);
        println!("agent_type: {}", s.agent_type);
        println!("parent_pid: {}", s.parent_pid);
        println!("context_id: {}", s.original_context_id);
        if let Some(prev) = &s.previous_session_id {
            println!("previous_session_id: {prev}");
        }
        println!("started_at: {}", s.started_at);
        println!("last_activity: {}", s.last_activity);
    }
    Ok(())
}

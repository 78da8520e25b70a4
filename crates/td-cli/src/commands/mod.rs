//! Top-level `clap` command tree and dispatch.
//!
//! [`Cli::execute`] resolves the [`RunContext`] once (honoring `session
//! rotate`'s need to mint a new identity before anything else runs) and
//! then hands the parsed arguments to the matching command module.

mod attach;
mod board;
mod comment;
mod config_cmd;
mod create;
mod delete;
mod dep;
mod error;
mod handoff;
mod list;
mod log;
mod note;
mod restore;
mod session_cmd;
mod show;
mod snapshot;
mod transition;
mod update;
mod worksession;

use crate::util::context;
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "td", version, about = "Local-first task and session coordination for concurrent AI coding agents")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Create(create::CreateArgs),
    Update(update::UpdateArgs),
    Delete(delete::DeleteArgs),
    Restore(restore::RestoreArgs),
    Show(show::ShowArgs),
    List(list::ListArgs),

    Start(transition::StartArgs),
    Unstart(transition::UnstartArgs),
    Review(transition::ReviewArgs),
    Reject(transition::RejectArgs),
    Block(transition::BlockArgs),
    Unblock(transition::UnblockArgs),
    Reopen(transition::ReopenArgs),
    Approve(transition::ApproveArgs),
    Close(transition::CloseArgs),

    Comment(comment::CommentArgs),
    Log(log::LogArgs),
    Handoff(handoff::HandoffArgs),
    Attach(attach::AttachArgs),
    Snapshot(snapshot::SnapshotArgs),

    Dep(dep::DepArgs),
    Board(board::BoardArgs),
    Note(note::NoteArgs),
    #[command(name = "worksession")]
    WorkSession(worksession::WorkSessionArgs),

    Config(config_cmd::ConfigArgs),
    Session(session_cmd::SessionArgs),
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        let force_rotate = matches!(&self.command, Commands::Session(args) if args.wants_rotate());
        let ctx = context::resolve(force_rotate)?;

        match self.command {
            Commands::Create(args) => create::execute(args, &ctx),
            Commands::Update(args) => update::execute(args, &ctx),
            Commands::Delete(args) => delete::execute(args, &ctx),
            Commands::Restore(args) => restore::execute(args, &ctx),
            Commands::Show(args) => show::execute(args, &ctx),
            Commands::List(args) => list::execute(args, &ctx),

            Commands::Start(args) => transition::start(args, &ctx),
            Commands::Unstart(args) => transition::unstart(args, &ctx),
            Commands::Review(args) => transition::review(args, &ctx),
            Commands::Reject(args) => transition::reject(args, &ctx),
            Commands::Block(args) => transition::block(args, &ctx),
            Commands::Unblock(args) => transition::unblock(args, &ctx),
            Commands::Reopen(args) => transition::reopen(args, &ctx),
            Commands::Approve(args) => transition::approve(args, &ctx),
            Commands::Close(args) => transition::close(args, &ctx),

            Commands::Comment(args) => comment::execute(args, &ctx),
            Commands::Log(args) => log::execute(args, &ctx),
            Commands::Handoff(args) => handoff::execute(args, &ctx),
            Commands::Attach(args) => attach::execute(args, &ctx),
            Commands::Snapshot(args) => snapshot::execute(args, &ctx),

            Commands::Dep(args) => dep::execute(args, &ctx),
            Commands::Board(args) => board::execute(args, &ctx),
            Commands::Note(args) => note::execute(args, &ctx),
            Commands::WorkSession(args) => worksession::execute(args, &ctx),

            Commands::Config(args) => config_cmd::execute(args, &ctx),
            Commands::Session(args) => session_cmd::execute(args, &ctx),
        }
    }
}

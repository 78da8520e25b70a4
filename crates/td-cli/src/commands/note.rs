//! `td note`: free-standing notes, separate from the issue graph, via
//! `create_note`/`update_note`/`delete_note`/`restore_note`.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::{Args, Subcommand};
use td_core::id::{normalize, IdKind};
use td_core::mutators::{CreateNoteInput, NoteUpdate};

#[derive(Args, Debug)]
pub struct NoteArgs {
    #[command(subcommand)]
    command: NoteCommand,
}

#[derive(Subcommand, Debug)]
enum NoteCommand {
    Create {
        title: String,
        body: String,
        #[arg(long)]
        json: bool,
    },
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    List {
        #[arg(long)]
        include_deleted: bool,
        #[arg(long)]
        json: bool,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        json: bool,
    },
    Delete {
        id: String,
        #[arg(long)]
        json: bool,
    },
    Restore {
        id: String,
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(args: NoteArgs, ctx: &RunContext) -> Result<()> {
    match args.command {
        NoteCommand::Create { title, body, json } => {
            let note = output::unwrap_or_fail(json, ctx.kernel.create_note(&ctx.actor(), CreateNoteInput { title, body }));
            if json {
                output::print_note(&note, true);
            } else {
                println!("CREATED {}", note.id);
            }
        }
        NoteCommand::Show { id, json } => {
            let id = output::unwrap_or_fail(json, normalize(IdKind::Note, &id));
            let note = output::unwrap_or_fail(json, ctx.kernel.store().get_note(&id));
            output::print_note(&note, json);
        }
        NoteCommand::List { include_deleted, json } => {
            let notes = output::unwrap_or_fail(json, ctx.kernel.store().list_notes(include_deleted));
            output::print_notes(&notes, json);
        }
        NoteCommand::Update { id, title, body, json } => {
            let patch = NoteUpdate { title, body };
            let note = output::unwrap_or_fail(json, ctx.kernel.update_note(&ctx.actor(), &id, patch));
            if json {
                output::print_note(&note, true);
            } else {
                println!("UPDATED {}", note.id);
            }
        }
        NoteCommand::Delete { id, json } => {
            let note = output::unwrap_or_fail(json, ctx.kernel.delete_note(&ctx.actor(), &id));
            if json {
                output::print_note(&note, true);
            } else {
                println!("DELETED {}", note.id);
            }
        }
        NoteCommand::Restore { id, json } => {
            let note = output::unwrap_or_fail(json, ctx.kernel.restore_note(&ctx.actor(), &id));
            if json {
                output::print_note(&note, true);
            } else {
                println!("RESTORED {}", note.id);
            }
        }
    }
    Ok(())
}

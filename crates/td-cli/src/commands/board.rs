//! `td board`: kanban-style board definitions and issue placements, via
//! `create_board`/`set_board_position`.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::{Args, Subcommand};
use td_core::mutators::{CreateBoardInput, SetBoardPositionInput};

#[derive(Args, Debug)]
pub struct BoardArgs {
    #[command(subcommand)]
    command: BoardCommand,
}

#[derive(Subcommand, Debug)]
enum BoardCommand {
    Create {
        name: String,
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
        json: bool,
    },
    /// Place (or move) an issue into a board column
    Place {
        board_id: String,
        issue_id: String,
        column: String,
        position: i64,
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(args: BoardArgs, ctx: &RunContext) -> Result<()> {
    match args.command {
        BoardCommand::Create { name, json } => {
            let board = output::unwrap_or_fail(json, ctx.kernel.create_board(&ctx.actor(), CreateBoardInput { name }));
            if json {
                output::print_board(&board, &[], true);
            } else {
                println!("CREATED {}", board.id);
            }
        }
        BoardCommand::Show { id, json } => {
            let board = output::unwrap_or_fail(json, ctx.kernel.store().get_board(&id));
            let positions = output::unwrap_or_fail(json, ctx.kernel.store().board_positions(&id));
            output::print_board(&board, &positions, json);
        }
        BoardCommand::List { json } => {
            let boards = output::unwrap_or_fail(json, ctx.kernel.store().list_boards());
            output::print_boards(&boards, json);
        }
        BoardCommand::Place { board_id, issue_id, column, position, json } => {
            let input = SetBoardPositionInput { board_id, issue_id, column, position };
            let pos = output::unwrap_or_fail(json, ctx.kernel.set_board_position(&ctx.actor(), input));
            if json {
                output::print_json(&pos);
            } else {
                println!("PLACED {} [{}] @ {}", pos.issue_id, pos.column, pos.position);
            }
        }
    }
    Ok(())
}

//! td - coordination kernel CLI
//!
//! A thin CLI over `td-core`: argument parsing and dispatch onto the
//! logged mutators and TDQ queries. Rendering and flag plumbing live here;
//! every decision about whether an action is allowed lives in the core.

use clap::Parser;

mod commands;
mod util;

use commands::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.execute() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

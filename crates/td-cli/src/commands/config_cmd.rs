//! `td config`: inspect and edit the persisted `config.json`.

use crate::util::context::RunContext;
use crate::util::output;
use anyhow::Result;
use clap::{Args, Subcommand};
use td_core::config;
use td_core::state_machine::EnforcementMode;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective configuration
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Set the state-machine enforcement mode
    SetEnforcementMode {
        mode: EnforcementModeArg,
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum EnforcementModeArg {
    Liberal,
    Advisory,
    Strict,
}

impl From<EnforcementModeArg> for EnforcementMode {
    fn from(value: EnforcementModeArg) -> Self {
        match value {
            EnforcementModeArg::Liberal => EnforcementMode::Liberal,
            EnforcementModeArg::Advisory => EnforcementMode::Advisory,
            EnforcementModeArg::Strict => EnforcementMode::Strict,
        }
    }
}

pub fn execute(args: ConfigArgs, ctx: &RunContext) -> Result<()> {
    match args.command {
        ConfigCommand::Show { json } => {
            if json {
                output::print_json(&ctx.config);
            } else {
                println!("enforcement_mode: {:?}", ctx.config.core.enforcement_mode);
                println!("sync_snapshot_threshold: {}", ctx.config.core.sync_snapshot_threshold);
                println!("tdq.max_results: {}", ctx.config.tdq.max_results);
                if let Some(f) = &ctx.config.tdq.last_filter {
                    println!("tdq.last_filter: {f}");
                }
                println!("display.format: {:?}", ctx.config.display.format);
                println!("display.color: {}", ctx.config.display.color);
                println!("display.timestamps: {:?}", ctx.config.display.timestamps);
                if let Some(r) = &ctx.config.retention.idle_prune_after {
                    println!("retention.idle_prune_after: {r}");
                }
            }
        }
        ConfigCommand::SetEnforcementMode { mode, json } => {
            let mut updated = ctx.config.clone();
            updated.core.enforcement_mode = mode.into();
            let result = config::save(&ctx.store_root, &updated).map_err(|e| {
                td_core::TdError::io(
                    ctx.store_root.clone(),
                    std::io::Error::other(e.to_string()),
                )
            });
            output::unwrap_or_fail(json, result);
            if json {
                output::print_json(&updated);
            } else {
                println!("UPDATED enforcement_mode = {:?}", updated.core.enforcement_mode);
            }
        }
    }
    Ok(())
}

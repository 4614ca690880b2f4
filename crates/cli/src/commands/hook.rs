// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt hook` - Inspect or clear the caller's hook slot

use clap::{Args, Subcommand};
use gt_beads::{slots, BeadsGateway};

use crate::commands::own_address;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use crate::GtDispatcher;

#[derive(Args)]
pub struct HookArgs {
    #[command(subcommand)]
    pub command: HookCommand,
}

#[derive(Subcommand)]
pub enum HookCommand {
    /// Show the bead on your hook
    Show,
    /// Clear your hook
    Clear {
        /// Also close the work bead (the `gt done` path)
        #[arg(long)]
        close: bool,
    },
}

pub async fn handle(
    args: HookArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let addr = own_address(dispatcher)?;

    match args.command {
        HookCommand::Show => {
            let bead_id = addr
                .bead_id(&dispatcher.ctx().routes)
                .map_err(|e| ExitError::new(1, e.to_string()))?;
            let hook = dispatcher
                .beads()
                .get_slot(&bead_id, slots::HOOK_BEAD)
                .await
                .map_err(|e| ExitError::from_dispatch(e.into(), format))?;

            match hook {
                Some(work) => {
                    let title = dispatcher
                        .beads()
                        .show(&work)
                        .await
                        .map(|b| b.title)
                        .unwrap_or_default();
                    match format {
                        OutputFormat::Json => println!(
                            "{}",
                            serde_json::json!({"hook": work, "title": title})
                        ),
                        OutputFormat::Text => println!("{work}  {title}"),
                    }
                }
                None => match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::json!({"hook": null}));
                    }
                    OutputFormat::Text => println!("hook is empty"),
                },
            }
        }
        HookCommand::Clear { close } => {
            let cleared = dispatcher
                .unhook(&addr, close)
                .await
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            match cleared {
                Some(bead) if close => println!("unhooked and closed {bead}"),
                Some(bead) => println!("unhooked {bead}"),
                None => println!("hook was already empty"),
            }
        }
    }
    Ok(())
}

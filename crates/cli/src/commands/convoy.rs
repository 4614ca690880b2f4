// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt convoy` - Dispatch-wave planning over a convoy's tracked beads

use clap::{Args, Subcommand};
use gt_beads::BeadsGateway;
use gt_core::{compute_waves, ConvoyNode};
use gt_dispatch::DispatchError;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use crate::GtDispatcher;

#[derive(Args)]
pub struct ConvoyArgs {
    #[command(subcommand)]
    pub command: ConvoyCommand,
}

#[derive(Subcommand)]
pub enum ConvoyCommand {
    /// Compute dispatch waves for a convoy
    Waves {
        /// Convoy bead id
        convoy: String,
    },
    /// Open convoys whose tracked beads are all closed
    Stranded,
}

pub async fn handle(
    args: ConvoyArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    match args.command {
        ConvoyCommand::Waves { convoy } => {
            let nodes = load_nodes(dispatcher, &convoy, format).await?;
            let waves = compute_waves(&nodes)
                .map_err(|e| ExitError::from_dispatch(DispatchError::Cycle(e), format))?;

            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&waves)
                        .map_err(|e| ExitError::new(1, e.to_string()))?
                ),
                OutputFormat::Text => {
                    if waves.is_empty() {
                        println!("convoy {convoy} has no slingable beads");
                        return Ok(());
                    }
                    for wave in &waves {
                        println!("wave {}: {}", wave.number, wave.tasks.join(", "));
                    }
                }
            }
        }
        ConvoyCommand::Stranded => {
            let stranded = dispatcher
                .stranded_convoys()
                .await
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string(&stranded)
                        .map_err(|e| ExitError::new(1, e.to_string()))?
                ),
                OutputFormat::Text => {
                    if stranded.is_empty() {
                        println!("no stranded convoys");
                    }
                    for convoy in &stranded {
                        println!("{convoy}");
                    }
                }
            }
        }
    }
    Ok(())
}

/// Fetch the convoy's tracked beads as planning nodes. Unreachable deps
/// are skipped with a warning rather than failing the whole plan.
async fn load_nodes(
    dispatcher: &GtDispatcher,
    convoy: &str,
    format: OutputFormat,
) -> Result<Vec<ConvoyNode>, ExitError> {
    // Existence check first, so a bad id is a clean not-found.
    dispatcher
        .beads()
        .show(convoy)
        .await
        .map_err(|e| ExitError::from_dispatch(e.into(), format))?;
    let deps = dispatcher
        .beads()
        .list_deps(convoy)
        .await
        .map_err(|e| ExitError::from_dispatch(e.into(), format))?;

    let mut nodes = Vec::with_capacity(deps.len());
    for dep in deps {
        match dispatcher.beads().show(dep.id()).await {
            Ok(bead) => nodes.push(bead.to_convoy_node()),
            Err(e) => tracing::warn!(dep = %dep, error = %e, "skipping unreachable dep"),
        }
    }
    Ok(nodes)
}

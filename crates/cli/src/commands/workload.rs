// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt workload` - Hooked beads for an agent, across every store

use clap::Args;

use crate::commands::address_or_own;
use crate::exit_error::ExitError;
use crate::output::{format_time_ago, OutputFormat};
use crate::GtDispatcher;

#[derive(Args)]
pub struct WorkloadArgs {
    /// Agent address; defaults to your own identity
    pub address: Option<String>,
}

pub async fn handle(
    args: WorkloadArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let addr = address_or_own(dispatcher, args.address.as_deref())?;
    let load = dispatcher
        .workload(&addr)
        .await
        .map_err(|e| ExitError::from_dispatch(e, format))?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&load)
                    .map_err(|e| ExitError::new(1, e.to_string()))?
            );
        }
        OutputFormat::Text => {
            if load.is_empty() {
                println!("no hooked work for {addr}");
                return Ok(());
            }
            let id_width = load
                .iter()
                .map(|b| b.id.len())
                .max()
                .unwrap_or(0)
                .max("BEAD".len());
            println!("{:<id_width$} PRI UPDATED TITLE", "BEAD");
            for bead in &load {
                println!(
                    "{:<id_width$} {:<3} {:<7} {}",
                    bead.id,
                    bead.priority,
                    format_time_ago(bead.updated_at),
                    bead.title
                );
            }
        }
    }
    Ok(())
}

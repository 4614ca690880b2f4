// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt sling` - Put a work bead on an agent's hook

use clap::Args;
use gt_dispatch::SlingOptions;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use crate::GtDispatcher;

#[derive(Args)]
pub struct SlingArgs {
    /// Work bead id
    pub bead: String,
    /// Target agent address (e.g. gastown/furiosa)
    pub target: String,
    /// Steal hooks instead of failing on conflicts
    #[arg(long)]
    pub force: bool,
    /// Skip the follow-up nudge to an idle target
    #[arg(long)]
    pub no_nudge: bool,
}

pub async fn handle(
    args: SlingArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let opts = SlingOptions { force: args.force, no_nudge: args.no_nudge };
    let outcome = dispatcher
        .sling(&args.bead, &args.target, &opts)
        .await
        .map_err(|e| ExitError::from_dispatch(e, format))?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "message": outcome.message,
                    "convoy": outcome.convoy,
                    "already_hooked": outcome.already_hooked,
                })
            );
        }
        OutputFormat::Text => {
            println!("{}", outcome.message);
            if let Some(convoy) = &outcome.convoy {
                println!("tracked by convoy {convoy}");
            }
        }
    }
    Ok(())
}

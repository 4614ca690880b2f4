// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt queue` - Drain the per-session nudge queue
//!
//! Agents call `gt queue drain` from their tool-post hook; the printed
//! system-reminder blocks land in the agent's context.

use clap::{Args, Subcommand};
use gt_dispatch::queue::drain_queue;

use crate::commands::own_address;
use crate::exit_error::ExitError;
use crate::GtDispatcher;

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommand,
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// Print and clear queued messages for a session
    Drain {
        /// Session name; defaults to your own
        session: Option<String>,
    },
}

pub async fn handle(args: QueueArgs, dispatcher: &GtDispatcher) -> Result<(), ExitError> {
    match args.command {
        QueueCommand::Drain { session } => {
            let session = match session {
                Some(s) => s,
                None => own_address(dispatcher)?.session_name(),
            };
            let drained = drain_queue(&dispatcher.ctx().town, &session)
                .map_err(|e| ExitError::new(1, e.to_string()))?;
            if let Some(content) = drained {
                print!("{content}");
            }
        }
    }
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt agent` / `gt peek` - Registry, identity beads, and pane peeking

use clap::{Args, Subcommand};
use gt_adapters::TerminalBackend;
use gt_beads::{slots, BeadsGateway};
use gt_core::{filter_and_sort_sessions, shortcut_key};

use crate::exit_error::ExitError;
use crate::output::{print_capture_frame, OutputFormat};
use crate::GtDispatcher;

#[derive(Args)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List live agents
    List {
        /// Include ephemeral polecats
        #[arg(long)]
        polecats: bool,
    },
    /// Create (or reopen) an agent identity bead
    Add {
        /// Agent address
        address: String,
    },
    /// Close an agent identity bead
    Remove {
        /// Agent address
        address: String,
        /// Remove even while a hook is set
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct PeekArgs {
    /// Agent address
    pub target: String,
    /// Lines of scrollback
    #[arg(long, default_value_t = 40)]
    pub lines: u32,
}

pub async fn handle(
    args: AgentArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    match args.command {
        AgentCommand::List { polecats } => {
            let sessions = dispatcher
                .term()
                .list_sessions()
                .await
                .map_err(|e| ExitError::from_dispatch(e.into(), format))?;
            let agents = filter_and_sort_sessions(&sessions, polecats, &dispatcher.ctx().routes);

            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&agents)
                        .map_err(|e| ExitError::new(1, e.to_string()))?
                ),
                OutputFormat::Text => {
                    if agents.is_empty() {
                        println!("no agents running");
                        return Ok(());
                    }
                    for (i, agent) in agents.iter().enumerate() {
                        let key = shortcut_key(i).map(String::from).unwrap_or_default();
                        println!("{:<1} {:<28} {}", key, agent.address, agent.session);
                    }
                }
            }
        }
        AgentCommand::Add { address } => {
            let addr = dispatcher
                .resolve_target(&address)
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            let bead_id = dispatcher
                .ensure_agent_bead(&addr)
                .await
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            println!("agent bead {bead_id}");
        }
        AgentCommand::Remove { address, force } => {
            let addr = dispatcher
                .resolve_target(&address)
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            let bead_id = addr
                .bead_id(&dispatcher.ctx().routes)
                .map_err(|e| ExitError::new(1, e.to_string()))?;

            // Safety gate: never drop an identity that still holds work.
            let hook = dispatcher
                .beads()
                .get_slot(&bead_id, slots::HOOK_BEAD)
                .await
                .map_err(|e| ExitError::from_dispatch(e.into(), format))?;
            if let Some(hook) = hook {
                if !force {
                    return Err(ExitError::new(
                        1,
                        format!("{addr} still has {hook} on its hook (use --force)"),
                    ));
                }
                dispatcher
                    .unhook(&addr, false)
                    .await
                    .map_err(|e| ExitError::from_dispatch(e, format))?;
            }
            dispatcher
                .beads()
                .close(&bead_id)
                .await
                .map_err(|e| ExitError::from_dispatch(e.into(), format))?;
            println!("removed {addr}");
        }
    }
    Ok(())
}

pub async fn handle_peek(args: PeekArgs, dispatcher: &GtDispatcher) -> Result<(), ExitError> {
    let addr = dispatcher
        .resolve_target(&args.target)
        .map_err(|e| ExitError::new(1, e.to_string()))?;
    let session = addr.session_name();
    let pane = dispatcher
        .term()
        .capture_pane(&session, args.lines)
        .await
        .map_err(|e| ExitError::new(1, e.to_string()))?;
    print_capture_frame(&session, &pane);
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `gt`: the Gas Town dispatcher CLI.

mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use gt_adapters::{PodBackend, RoutedBackend, TmuxBackend};
use gt_beads::BdCli;
use gt_core::{GtContext, SystemClock};
use gt_dispatch::Dispatcher;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;

/// The concrete dispatcher the CLI drives.
pub(crate) type GtDispatcher =
    Dispatcher<BdCli, RoutedBackend<TmuxBackend, PodBackend>, SystemClock>;

#[derive(Parser)]
#[command(name = "gt", version, about = "Gas Town: multi-agent workspace orchestrator")]
struct Cli {
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Place a work bead on an agent's hook
    Sling(commands::sling::SlingArgs),
    /// Inspect or clear your own hook
    Hook(commands::hook::HookArgs),
    /// List hooked work for an agent
    Workload(commands::workload::WorkloadArgs),
    /// Send a synchronous message to an agent or channel
    Nudge(commands::nudge::NudgeArgs),
    /// Agent-to-agent mail
    Mail(commands::mail::MailArgs),
    /// Account quota status and rotation
    Quota(commands::quota::QuotaArgs),
    /// Restart the town's agents
    Restart(commands::restart::RestartArgs),
    /// Start the configured agent set
    Up(commands::restart::UpDownArgs),
    /// Stop the town's agents
    Down(commands::restart::UpDownArgs),
    /// Agent identity and session registry
    Agent(commands::agent::AgentArgs),
    /// Show an agent's recent pane output
    Peek(commands::agent::PeekArgs),
    /// Convoy planning
    Convoy(commands::convoy::ConvoyArgs),
    /// Branch-stack DAG operations
    Refinery(commands::refinery::RefineryArgs),
    /// Per-session nudge queues
    Queue(commands::queue::QueueArgs),
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("GT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the production dispatcher for the discovered town.
fn build_dispatcher(format: OutputFormat) -> Result<GtDispatcher, ExitError> {
    let cwd = std::env::current_dir()
        .map_err(|e| ExitError::new(1, format!("cannot read working directory: {e}")))?;
    let ctx = GtContext::load(&cwd)
        .map_err(|e| ExitError::from_dispatch(e.into(), format))?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let beads = BdCli::new(ctx.town.clone(), ctx.routes.clone()).with_cancel(cancel.clone());
    let term = RoutedBackend::local_only(TmuxBackend::new().with_cancel(cancel.clone()));
    Ok(Dispatcher::new(ctx, beads, term, SystemClock).with_cancel(cancel))
}

async fn run(cli: Cli) -> Result<(), ExitError> {
    let format = OutputFormat::from_flag(cli.json);
    let dispatcher = build_dispatcher(format)?;

    match cli.command {
        Command::Sling(args) => commands::sling::handle(args, &dispatcher, format).await,
        Command::Hook(args) => commands::hook::handle(args, &dispatcher, format).await,
        Command::Workload(args) => commands::workload::handle(args, &dispatcher, format).await,
        Command::Nudge(args) => commands::nudge::handle(args, &dispatcher, format).await,
        Command::Mail(args) => commands::mail::handle(args, &dispatcher, format).await,
        Command::Quota(args) => commands::quota::handle(args, &dispatcher, format).await,
        Command::Restart(args) => commands::restart::handle(args, &dispatcher, format).await,
        Command::Up(args) => commands::restart::handle_up(args, &dispatcher, format).await,
        Command::Down(args) => commands::restart::handle_down(args, &dispatcher, format).await,
        Command::Agent(args) => commands::agent::handle(args, &dispatcher, format).await,
        Command::Peek(args) => commands::agent::handle_peek(args, &dispatcher).await,
        Command::Convoy(args) => commands::convoy::handle(args, &dispatcher, format).await,
        Command::Refinery(args) => commands::refinery::handle(args, &dispatcher, format).await,
        Command::Queue(args) => commands::queue::handle(args, &dispatcher).await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        if !err.is_silent() {
            eprintln!("{err}");
        }
        std::process::exit(err.code);
    }
}

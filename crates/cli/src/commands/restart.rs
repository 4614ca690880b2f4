// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt restart` / `gt up` / `gt down` - Town lifecycle sweeps

use clap::Args;
use gt_dispatch::{RestartOptions, RestartReport, RestartStrategy};

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use crate::GtDispatcher;

fn parse_strategy(s: &str) -> Result<RestartStrategy, String> {
    RestartStrategy::parse(s)
        .ok_or_else(|| format!("unknown strategy {s:?} (graceful|drain|immediate|clean)"))
}

#[derive(Args)]
pub struct RestartArgs {
    #[arg(long, value_parser = parse_strategy, default_value = "graceful")]
    pub strategy: RestartStrategy,
    /// Only town singletons and rig singletons
    #[arg(long)]
    pub infra: bool,
}

#[derive(Args)]
pub struct UpDownArgs {
    /// Only town singletons and rig singletons
    #[arg(long)]
    pub infra: bool,
}

pub async fn handle(
    args: RestartArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let opts = RestartOptions { strategy: args.strategy, infra_only: args.infra };
    let report = dispatcher
        .restart(&opts)
        .await
        .map_err(|e| ExitError::from_dispatch(e, format))?;
    print_report(&report, format)
}

pub async fn handle_up(
    args: UpDownArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let opts = RestartOptions { infra_only: args.infra, ..RestartOptions::default() };
    let report = dispatcher
        .up(&opts)
        .await
        .map_err(|e| ExitError::from_dispatch(e, format))?;
    print_report(&report, format)
}

pub async fn handle_down(
    args: UpDownArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let opts = RestartOptions { infra_only: args.infra, ..RestartOptions::default() };
    let report = dispatcher
        .down(&opts)
        .await
        .map_err(|e| ExitError::from_dispatch(e, format))?;
    print_report(&report, format)
}

fn print_report(report: &RestartReport, format: OutputFormat) -> Result<(), ExitError> {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "stopped": report.stopped,
                    "started": report.started,
                    "restored": report.restored,
                    "failures": report
                        .failures
                        .iter()
                        .map(|(session, error)| serde_json::json!({
                            "session": session,
                            "error": error,
                        }))
                        .collect::<Vec<_>>(),
                })
            );
        }
        OutputFormat::Text => {
            for session in &report.stopped {
                println!("stopped {session}");
            }
            for session in &report.started {
                println!("started {session}");
            }
            for session in &report.restored {
                println!("restored {session} (hook intact)");
            }
            for (session, error) in &report.failures {
                eprintln!("failed {session}: {error}");
            }
        }
    }
    if report.failures.is_empty() {
        Ok(())
    } else {
        Err(ExitError::silent(1))
    }
}

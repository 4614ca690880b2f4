// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt quota` - Account status, scan, and rotation

use clap::{Args, Subcommand};
use gt_dispatch::quota::RotateOptions;
use gt_dispatch::Accounts;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use crate::GtDispatcher;

#[derive(Args)]
pub struct QuotaArgs {
    #[command(subcommand)]
    pub command: QuotaCommand,
}

#[derive(Subcommand)]
pub enum QuotaCommand {
    /// Show the account roster
    Status,
    /// Classify live sessions as rate-limited or not
    Scan {
        /// Persist detected-limited status onto the roster
        #[arg(long)]
        update: bool,
    },
    /// Move limited sessions onto available accounts
    Rotate {
        /// Plan only; no side effects
        #[arg(long)]
        dry_run: bool,
        /// Preemptively rotate sessions on this handle (only)
        #[arg(long, value_name = "HANDLE")]
        from: Option<String>,
        /// Skip sessions that are mid-task
        #[arg(long)]
        idle: bool,
    },
    /// Mark accounts available again
    Clear {
        /// Handles to clear; none clears every limited/cooldown account
        handles: Vec<String>,
    },
}

pub async fn handle(
    args: QuotaArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let accounts_path = dispatcher.ctx().town.accounts_json();
    let mut accounts =
        Accounts::load(&accounts_path).map_err(|e| ExitError::from_dispatch(e, format))?;

    match args.command {
        QuotaCommand::Status => match format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&accounts)
                    .map_err(|e| ExitError::new(1, e.to_string()))?
            ),
            OutputFormat::Text => {
                if accounts.accounts.is_empty() {
                    println!("no accounts registered");
                    return Ok(());
                }
                for account in &accounts.accounts {
                    let resets = account
                        .resets_at
                        .as_deref()
                        .map(|r| format!(" (resets {r})"))
                        .unwrap_or_default();
                    println!("{:<12} {}{}", account.handle, account.status, resets);
                }
            }
        },
        QuotaCommand::Scan { update } => {
            let scans = dispatcher
                .quota_scan(&accounts)
                .await
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            if update {
                let marked = dispatcher.apply_scan(&mut accounts, &scans);
                accounts
                    .save(&accounts_path)
                    .map_err(|e| ExitError::from_dispatch(e, format))?;
                for handle in marked {
                    eprintln!("marked {handle} limited");
                }
            }
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&scans)
                        .map_err(|e| ExitError::new(1, e.to_string()))?
                ),
                OutputFormat::Text => {
                    for scan in &scans {
                        let state = if scan.limited { "LIMITED" } else { "ok" };
                        let account = scan.account.as_deref().unwrap_or("-");
                        println!("{:<24} {:<8} {}", scan.session, state, account);
                    }
                }
            }
        }
        QuotaCommand::Rotate { dry_run, from, idle } => {
            let scans = dispatcher
                .quota_scan(&accounts)
                .await
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            let opts = RotateOptions { from: from.as_deref(), idle_only: idle, dry_run };
            let plan = dispatcher
                .quota_plan(&scans, &accounts, &opts)
                .await
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            let report = dispatcher
                .quota_execute(&plan, &mut accounts, dry_run)
                .await
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            if !dry_run {
                accounts
                    .save(&accounts_path)
                    .map_err(|e| ExitError::from_dispatch(e, format))?;
            }

            let verb = if dry_run { "would rotate" } else { "rotated" };
            for mv in &report.rotated {
                println!(
                    "{verb} {} -> {} ({})",
                    mv.session,
                    mv.to_handle,
                    mv.config_dir.display()
                );
            }
            for session in &plan.unplanned {
                println!("no account available for {session}");
            }
            for (session, error) in &report.failures {
                eprintln!("failed {session}: {error}");
            }
            if !report.failures.is_empty() {
                return Err(ExitError::silent(1));
            }
        }
        QuotaCommand::Clear { handles } => {
            let cleared = accounts.clear(&handles);
            accounts
                .save(&accounts_path)
                .map_err(|e| ExitError::from_dispatch(e, format))?;
            if cleared.is_empty() {
                println!("nothing to clear");
            } else {
                println!("cleared: {}", cleared.join(", "));
            }
        }
    }
    Ok(())
}

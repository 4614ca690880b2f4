// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt nudge` - Keystroke-level delivery to agent sessions

use clap::Args;
use gt_dispatch::{DeliveryMode, NudgeOptions, NudgeReport};
use std::time::Duration;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use crate::GtDispatcher;

#[derive(Args)]
pub struct NudgeArgs {
    /// Address, role shortcut, or channel:<name>
    pub target: String,
    /// Message text (or use -m)
    pub text: Option<String>,
    /// Message text
    #[arg(short, long)]
    pub message: Option<String>,
    /// Bypass do-not-disturb
    #[arg(long)]
    pub force: bool,
    /// Queue to the session's reminder file instead of typing.
    /// Queued messages are read at the target's next tool use, even if it
    /// is idle now.
    #[arg(long, conflicts_with_all = ["delay", "wait_ready"])]
    pub queue: bool,
    /// Sleep this many milliseconds before sending
    #[arg(long, value_name = "MS", conflicts_with = "wait_ready")]
    pub delay: Option<u64>,
    /// Wait for a live agent before sending
    #[arg(long)]
    pub wait_ready: bool,
    /// Ceiling for --wait-ready, in seconds
    #[arg(long, value_name = "S", default_value_t = 60)]
    pub wait_timeout: u64,
}

pub async fn handle(
    args: NudgeArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let message = args
        .message
        .or(args.text)
        .ok_or_else(|| ExitError::new(1, "no message given (pass MSG or -m MSG)"))?;

    let mode = if args.queue {
        DeliveryMode::Queued
    } else if let Some(ms) = args.delay {
        DeliveryMode::Delayed(Duration::from_millis(ms))
    } else if args.wait_ready {
        DeliveryMode::WaitReady
    } else {
        DeliveryMode::Direct
    };
    let opts = NudgeOptions {
        force: args.force,
        mode,
        wait_timeout: Duration::from_secs(args.wait_timeout),
    };

    let report = dispatcher
        .nudge(&args.target, &message, &opts)
        .await
        .map_err(|e| ExitError::from_dispatch(e, format))?;
    print_report(&report, format);

    if report.all_ok() {
        Ok(())
    } else {
        Err(ExitError::silent(1))
    }
}

fn print_report(report: &NudgeReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "delivered": report.delivered,
                    "muted": report.muted,
                    "failures": report
                        .failures
                        .iter()
                        .map(|(target, error)| serde_json::json!({
                            "target": target,
                            "error": error,
                        }))
                        .collect::<Vec<_>>(),
                })
            );
        }
        OutputFormat::Text => {
            for target in &report.delivered {
                println!("nudged {target}");
            }
            for target in &report.muted {
                println!("skipped {target} (muted; use --force)");
            }
            for (target, error) in &report.failures {
                eprintln!("failed {target}: {error}");
            }
        }
    }
}

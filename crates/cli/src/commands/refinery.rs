// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gt refinery` - Branch-stack DAG surface for the merge queue

use clap::{Args, Subcommand};
use gt_refinery::BranchDag;

use crate::commands::own_address;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use crate::GtDispatcher;

#[derive(Args)]
pub struct RefineryArgs {
    #[command(subcommand)]
    pub command: RefineryCommand,
}

#[derive(Subcommand)]
pub enum RefineryCommand {
    /// Register a branch in the stack
    Register {
        branch: String,
        /// Branch this one stacks on (default: the default branch)
        #[arg(long, default_value = "")]
        depends_on: String,
        /// Source work bead
        #[arg(long, default_value = "")]
        issue: String,
        /// Responsible worker address; defaults to your identity
        #[arg(long)]
        worker: Option<String>,
    },
    /// Remove a branch nothing depends on
    Unregister { branch: String },
    /// Record a merge and cascade retargets
    Merged { branch: String },
    /// Branches needing a rebase, dependencies first
    Order,
    /// Branches ready for the merge queue
    Ready,
    /// Status counts
    Stats,
    /// Check DAG consistency
    Validate,
}

pub async fn handle(
    args: RefineryArgs,
    dispatcher: &GtDispatcher,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let repo_root = std::env::current_dir()
        .map_err(|e| ExitError::new(1, format!("cannot read working directory: {e}")))?;
    let mut dag = BranchDag::load(&repo_root)
        .map_err(|e| ExitError::from_dispatch(e.into(), format))?;

    match args.command {
        RefineryCommand::Register { branch, depends_on, issue, worker } => {
            let worker = match worker {
                Some(w) => w,
                None => own_address(dispatcher)?.to_string(),
            };
            dag.register_branch(&branch, &depends_on, &issue, &worker)
                .map_err(|e| ExitError::from_dispatch(e.into(), format))?;
            println!("registered {branch}");
        }
        RefineryCommand::Unregister { branch } => {
            dag.unregister_branch(&branch)
                .map_err(|e| ExitError::from_dispatch(e.into(), format))?;
            println!("unregistered {branch}");
        }
        RefineryCommand::Merged { branch } => {
            // The dispatcher doubles as the merge signaller: workers get
            // their retarget/rebase notices as direct nudges.
            let cascade = dag
                .handle_branch_merged(&branch, dispatcher)
                .await
                .map_err(|e| ExitError::from_dispatch(e.into(), format))?;
            println!("merged {}", cascade.merged);
            for branch in &cascade.retargeted {
                println!("retargeted {branch} -> default branch (needs rebase)");
            }
        }
        RefineryCommand::Order => {
            for branch in dag.rebase_order() {
                println!("{branch}");
            }
        }
        RefineryCommand::Ready => {
            for branch in dag.ready_branches() {
                println!("{branch}");
            }
        }
        RefineryCommand::Stats => {
            let stats = dag.stats();
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string(&stats).map_err(|e| ExitError::new(1, e.to_string()))?
                ),
                OutputFormat::Text => println!(
                    "{} branches: {} clean, {} needs rebase, {} merged",
                    stats.total, stats.clean, stats.needs_rebase, stats.merged
                ),
            }
        }
        RefineryCommand::Validate => {
            dag.validate()
                .map_err(|e| ExitError::from_dispatch(e.into(), format))?;
            println!("branch DAG is consistent");
        }
    }
    Ok(())
}

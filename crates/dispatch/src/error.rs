// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher error taxonomy.
//!
//! One kind per failure category; the CLI renders `kind()` plus the
//! message, and `hints()` when it has a suggestion. The dispatcher
//! recovers from nothing except lock contention, which surfaces as a user
//! error; gateway and backend failures bubble unchanged.

use gt_beads::BeadsError;
use gt_core::address::AddressError;
use gt_core::convoy::CycleError;
use gt_refinery::DagError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("not inside a Gas Town workspace (no mayor/town.json found)")]
    NotInWorkspace,
    #[error("unknown address: {0}")]
    UnknownAddress(String),
    #[error("{target} is already hooked to {existing}")]
    HookConflict { target: String, existing: String },
    #[error("bead {bead} is already being slung")]
    LockContention { bead: String },
    #[error("bead {bead} is {status}, not slingable")]
    NotSlingable { bead: String, status: String },
    #[error("hook invariant violated: {0}")]
    InvariantViolation(String),
    #[error(transparent)]
    Store(#[from] BeadsError),
    #[error(transparent)]
    Backend(#[from] gt_adapters::BackendError),
    #[error(transparent)]
    Dag(#[from] DagError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("operation cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AddressError> for DispatchError {
    fn from(e: AddressError) -> Self {
        DispatchError::UnknownAddress(e.to_string())
    }
}

impl From<gt_core::TownError> for DispatchError {
    fn from(e: gt_core::TownError) -> Self {
        match e {
            gt_core::TownError::NotInWorkspace => DispatchError::NotInWorkspace,
            gt_core::TownError::Io(e) => DispatchError::Io(e),
            gt_core::TownError::Json(e) => {
                DispatchError::Store(BeadsError::Malformed(e.to_string()))
            }
        }
    }
}

impl DispatchError {
    /// Stable machine-readable category for JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::NotInWorkspace => "not_in_workspace",
            DispatchError::UnknownAddress(_) => "unknown_address",
            DispatchError::HookConflict { .. } => "hook_conflict",
            DispatchError::LockContention { .. } => "lock_contention",
            DispatchError::NotSlingable { .. } => "not_slingable",
            DispatchError::InvariantViolation(_) => "invariant_violation",
            DispatchError::Store(BeadsError::NotFound(_)) => "store_not_found",
            DispatchError::Store(BeadsError::Cancelled) => "cancelled",
            DispatchError::Store(_) => "store_unavailable",
            DispatchError::Backend(gt_adapters::BackendError::Cancelled) => "cancelled",
            DispatchError::Backend(_) => "backend_unavailable",
            DispatchError::Dag(DagError::CycleDetected { .. }) => "cycle_detected",
            DispatchError::Dag(_) => "dag_error",
            DispatchError::Cycle(_) => "cycle_detected",
            DispatchError::Timeout(_) => "timeout",
            DispatchError::Cancelled => "cancelled",
            DispatchError::Io(_) => "io",
        }
    }

    /// Follow-up suggestions for the user, possibly empty.
    pub fn hints(&self) -> Vec<String> {
        match self {
            DispatchError::NotInWorkspace => {
                vec!["run inside a town, or set GT_ROOT".to_string()]
            }
            DispatchError::HookConflict { .. } => {
                vec!["re-run with --force to steal the hook".to_string()]
            }
            DispatchError::LockContention { .. } => {
                vec!["another sling is in flight; try again shortly".to_string()]
            }
            DispatchError::Cycle(e) => {
                vec![format!("break the cycle: {}", e.path.join(" -> "))]
            }
            _ => Vec::new(),
        }
    }

    /// The `{error:{kind,message,hints}}` shape for `--json` output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
                "hints": self.hints(),
            }
        })
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Branch DAG error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DagError {
    #[error("branch not registered: {0}")]
    UnknownBranch(String),
    #[error("branch already registered: {0}")]
    BranchExists(String),
    #[error("unknown dependency {depends_on:?} for branch {branch:?}")]
    UnknownDependency { branch: String, depends_on: String },
    #[error("registering {branch:?} would create a cycle: {}", path.join(" -> "))]
    CycleDetected { branch: String, path: Vec<String> },
    #[error("branch {branch:?} still has dependents: {}", dependents.join(", "))]
    HasDependents { branch: String, dependents: Vec<String> },
    #[error("branch {branch:?} depends on merged branch {depends_on:?}")]
    MergedDependency { branch: String, depends_on: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed branch DAG: {0}")]
    Json(#[from] serde_json::Error),
}

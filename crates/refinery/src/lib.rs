// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gt-refinery: the branch-stack DAG behind the merge queue.
//!
//! Stacked branches form a dependency DAG rooted at the default branch.
//! When a branch merges, its dependents are retargeted to root and flagged
//! for rebase, and the affected workers are signalled through a pluggable
//! [`MergeSignaller`]. The whole DAG is rewritten atomically to
//! `.gastown/branch-dag.json` after every mutation; concurrent
//! orchestrators on one repo are the caller's problem, not this crate's.

pub mod dag;
pub mod error;
pub mod signal;

pub use dag::{BranchDag, BranchNode, BranchStatus, DagStats, MergeCascade};
pub use error::DagError;
pub use signal::{MergeSignal, MergeSignaller, NoopSignaller, SignalError};

#[cfg(any(test, feature = "test-support"))]
pub use signal::CollectingSignaller;

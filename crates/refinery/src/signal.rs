// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merge cascade signalling.
//!
//! Signals are fire-and-forget: the cascade logs delivery failures and
//! keeps going. The dispatcher plugs in a signaller that nudges the
//! affected workers; tests plug in a collector.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("signal delivery failed: {0}")]
pub struct SignalError(pub String);

/// What happened to a branch during a merge cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeSignal {
    /// The worker's branch was merged.
    Merged { branch: String },
    /// The branch was retargeted from `old_dep` onto the default branch.
    Retargeted { branch: String, old_dep: String },
    /// The branch must be rebased before it can merge.
    RebaseNeeded { branch: String },
}

impl fmt::Display for MergeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeSignal::Merged { branch } => write!(f, "branch {branch} was merged"),
            MergeSignal::Retargeted { branch, old_dep } => {
                write!(f, "branch {branch} retargeted from {old_dep} to the default branch")
            }
            MergeSignal::RebaseNeeded { branch } => {
                write!(f, "branch {branch} needs a rebase before it can merge")
            }
        }
    }
}

/// Delivery seam for merge cascade notifications.
#[async_trait]
pub trait MergeSignaller: Send + Sync {
    async fn signal(&self, worker: &str, signal: MergeSignal) -> Result<(), SignalError>;
}

/// Discards every signal. Used when no delivery channel is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSignaller;

#[async_trait]
impl MergeSignaller for NoopSignaller {
    async fn signal(&self, _worker: &str, _signal: MergeSignal) -> Result<(), SignalError> {
        Ok(())
    }
}

/// Records `(worker, signal)` pairs for assertions.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct CollectingSignaller {
    signals: std::sync::Arc<parking_lot::Mutex<Vec<(String, MergeSignal)>>>,
    fail: std::sync::Arc<parking_lot::Mutex<bool>>,
}

#[cfg(any(test, feature = "test-support"))]
impl CollectingSignaller {
    pub fn new() -> CollectingSignaller {
        CollectingSignaller::default()
    }

    pub fn signals(&self) -> Vec<(String, MergeSignal)> {
        self.signals.lock().clone()
    }

    /// Make every delivery fail (the cascade must still complete).
    pub fn fail_all(&self) {
        *self.fail.lock() = true;
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl MergeSignaller for CollectingSignaller {
    async fn signal(&self, worker: &str, signal: MergeSignal) -> Result<(), SignalError> {
        if *self.fail.lock() {
            return Err(SignalError("collector set to fail".to_string()));
        }
        self.signals.lock().push((worker.to_string(), signal));
        Ok(())
    }
}

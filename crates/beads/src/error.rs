// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway error taxonomy.
//!
//! `NotFound` is a distinguished value, not a generic failure: callers
//! branch on it (e.g. sling creates a missing agent bead). Everything else
//! propagates unchanged; the dispatcher decides whether to retry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BeadsError {
    #[error("bead not found: {0}")]
    NotFound(String),
    #[error("issue store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed store output: {0}")]
    Malformed(String),
    #[error("operation cancelled")]
    Cancelled,
}

impl BeadsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BeadsError::NotFound(_))
    }
}

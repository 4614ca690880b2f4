// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("terminal backend unavailable: {0}")]
    Unavailable(String),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("operation cancelled")]
    Cancelled,
}

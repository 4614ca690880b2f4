// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination. A silent
//! exit (empty message) conveys status purely through the exit code,
//! e.g. `gt mail check` exiting 1 when there is no unread mail.

use gt_dispatch::DispatchError;
use std::fmt;

use crate::output::OutputFormat;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Exit code only; nothing printed.
    pub fn silent(code: i32) -> Self {
        Self { code, message: String::new() }
    }

    pub fn is_silent(&self) -> bool {
        self.message.is_empty()
    }

    /// Render a dispatcher error for the chosen output format.
    pub fn from_dispatch(err: DispatchError, format: OutputFormat) -> Self {
        let message = match format {
            OutputFormat::Json => err.to_json().to_string(),
            OutputFormat::Text => {
                let mut message = format!("{err}");
                for hint in err.hints() {
                    message.push_str(&format!("\n  hint: {hint}"));
                }
                message
            }
        };
        Self { code: 1, message }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<DispatchError> for ExitError {
    fn from(err: DispatchError) -> Self {
        ExitError::from_dispatch(err, OutputFormat::Text)
    }
}

impl From<anyhow::Error> for ExitError {
    fn from(err: anyhow::Error) -> Self {
        ExitError::new(1, err.to_string())
    }
}

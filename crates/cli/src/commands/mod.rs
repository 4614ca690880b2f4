// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command handlers, one module per top-level subcommand.

pub mod agent;
pub mod convoy;
pub mod hook;
pub mod mail;
pub mod nudge;
pub mod queue;
pub mod quota;
pub mod refinery;
pub mod restart;
pub mod sling;
pub mod workload;

use gt_core::AgentAddress;

use crate::exit_error::ExitError;
use crate::GtDispatcher;

/// The caller's own address, or a user error telling them how to set it.
pub(crate) fn own_address(dispatcher: &GtDispatcher) -> Result<AgentAddress, ExitError> {
    dispatcher
        .ctx()
        .identity
        .as_ref()
        .map(|i| i.address.clone())
        .ok_or_else(|| {
            ExitError::new(1, "no agent identity in this shell (set GT_ROLE / GT_RIG)")
        })
}

/// Resolve an optional address argument, defaulting to the caller.
pub(crate) fn address_or_own(
    dispatcher: &GtDispatcher,
    addr: Option<&str>,
) -> Result<AgentAddress, ExitError> {
    match addr {
        Some(s) => dispatcher
            .resolve_target(s)
            .map_err(|e| ExitError::new(1, e.to_string())),
        None => own_address(dispatcher),
    }
}

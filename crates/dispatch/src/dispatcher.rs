// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatcher: generic over its three seams.
//!
//! Operations live in per-concern impl blocks (`hook.rs`, `nudge.rs`,
//! `mail.rs`, `quota.rs`, `restart.rs`); this module holds construction and
//! the helpers they share.

use gt_adapters::TerminalBackend;
use gt_beads::{slots, BeadsGateway};
use gt_core::{AgentAddress, Clock, GtContext, ScopedLock};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;

/// One dispatcher invocation's wiring.
pub struct Dispatcher<B, T, C> {
    pub(crate) ctx: GtContext,
    pub(crate) beads: B,
    pub(crate) term: T,
    pub(crate) clock: C,
    pub(crate) cancel: CancellationToken,
}

impl<B, T, C> Dispatcher<B, T, C>
where
    B: BeadsGateway,
    T: TerminalBackend,
    C: Clock,
{
    pub fn new(ctx: GtContext, beads: B, term: T, clock: C) -> Dispatcher<B, T, C> {
        Dispatcher {
            ctx,
            beads,
            term,
            clock,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Dispatcher<B, T, C> {
        self.cancel = cancel;
        self
    }

    pub fn ctx(&self) -> &GtContext {
        &self.ctx
    }

    pub fn beads(&self) -> &B {
        &self.beads
    }

    pub fn term(&self) -> &T {
        &self.term
    }

    /// Refuse to start new work after cancellation. In-flight store
    /// writes are left to complete; they are not re-entrant.
    pub(crate) fn check_cancelled(&self) -> Result<(), DispatchError> {
        if self.cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }
        Ok(())
    }

    /// Resolve a user-supplied target string to an address.
    ///
    /// Accepts the six address shapes plus the bare role shortcuts
    /// `witness` and `refinery`, which take the rig from the caller's
    /// identity.
    pub fn resolve_target(&self, target: &str) -> Result<AgentAddress, DispatchError> {
        match target {
            "witness" | "refinery" => {
                let rig = self
                    .ctx
                    .current_rig()
                    .ok_or_else(|| {
                        DispatchError::UnknownAddress(format!(
                            "{target} needs a rig context (set GT_RIG or use <rig>/{target})"
                        ))
                    })?
                    .to_string();
                Ok(if target == "witness" {
                    AgentAddress::Witness { rig }
                } else {
                    AgentAddress::Refinery { rig }
                })
            }
            _ => Ok(AgentAddress::parse(target)?),
        }
    }

    /// Bead id for an address, through the routes table.
    pub(crate) fn agent_bead_id(&self, addr: &AgentAddress) -> Result<String, DispatchError> {
        Ok(addr.bead_id(&self.ctx.routes)?)
    }

    /// Look up the agent bead, creating (or reopening) it when absent;
    /// the identity-add path sling relies on.
    pub async fn ensure_agent_bead(
        &self,
        addr: &AgentAddress,
    ) -> Result<String, DispatchError> {
        let bead_id = self.agent_bead_id(addr)?;
        let mut fields = BTreeMap::new();
        fields.insert(slots::ROLE_TYPE.to_string(), addr.role().to_string());
        fields.insert(
            slots::RIG.to_string(),
            addr.rig().unwrap_or_default().to_string(),
        );
        self.beads
            .create_or_reopen_agent_bead(&bead_id, &format!("Agent: {addr}"), &fields)
            .await?;
        Ok(bead_id)
    }

    /// Advisory lock path for a work bead.
    pub(crate) fn bead_lock_path(&self, bead_id: &str) -> PathBuf {
        self.ctx
            .town
            .locks_dir()
            .join(format!("{}.lock", gt_core::sanitize_filename(bead_id)))
    }

    /// Take the per-bead sling lock; contention is a user error, never
    /// retried here.
    pub(crate) fn lock_bead(&self, bead_id: &str) -> Result<ScopedLock, DispatchError> {
        ScopedLock::acquire(&self.bead_lock_path(bead_id)).map_err(|e| match e {
            gt_core::LockError::Held { .. } => {
                DispatchError::LockContention { bead: bead_id.to_string() }
            }
            gt_core::LockError::Io(e) => DispatchError::Io(e),
        })
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

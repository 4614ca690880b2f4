// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook slot assignment and workload accounting.
//!
//! Sling is the only writer of hook slots. The transaction runs under the
//! per-work-bead advisory lock: re-check the target's hook, write the hook
//! slot, then flip the work bead to hooked/assigned. If the second write
//! fails the first is rolled back so invariants H1 (one hook per agent)
//! and H2 (one claimant per work bead) hold on every exit path.

use gt_adapters::TerminalBackend;
use gt_beads::{slots, Bead, BeadsGateway, BeadStatus};
use gt_core::{AgentAddress, Clock};
use std::time::Duration;

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::events::EventRecord;

/// Hard ceiling on one sling invocation.
pub const SLING_DEADLINE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default)]
pub struct SlingOptions {
    /// Steal hooks instead of failing on conflicts.
    pub force: bool,
    /// Skip the follow-up nudge to an idle target.
    pub no_nudge: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlingOutcome {
    pub message: String,
    /// Open convoy tracking the slung bead, when there is one.
    pub convoy: Option<String>,
    /// True when the bead was already on the target's hook.
    pub already_hooked: bool,
}

impl<B, T, C> Dispatcher<B, T, C>
where
    B: BeadsGateway,
    T: TerminalBackend,
    C: Clock,
{
    /// Place a work bead on an agent's hook.
    pub async fn sling(
        &self,
        work_bead: &str,
        target: &str,
        opts: &SlingOptions,
    ) -> Result<SlingOutcome, DispatchError> {
        match tokio::time::timeout(SLING_DEADLINE, self.sling_inner(work_bead, target, opts))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(SLING_DEADLINE)),
        }
    }

    async fn sling_inner(
        &self,
        work_bead: &str,
        target: &str,
        opts: &SlingOptions,
    ) -> Result<SlingOutcome, DispatchError> {
        self.check_cancelled()?;
        let target_addr = self.resolve_target(target)?;
        let work = self.beads.show(work_bead).await?;
        match work.status {
            BeadStatus::Open | BeadStatus::Hooked => {}
            other => {
                return Err(DispatchError::NotSlingable {
                    bead: work_bead.to_string(),
                    status: other.to_string(),
                })
            }
        }

        let agent_bead = self.ensure_agent_bead(&target_addr).await?;
        let lock = self.lock_bead(work_bead)?;

        // Re-read under the lock; another sling may have won the race.
        let previous_hook = self.beads.get_slot(&agent_bead, slots::HOOK_BEAD).await?;
        match previous_hook.as_deref() {
            Some(existing) if existing == work_bead => {
                let convoy = self.convoy_tracking(work_bead).await;
                return Ok(SlingOutcome {
                    message: format!("{work_bead} already on {target_addr}'s hook"),
                    convoy,
                    already_hooked: true,
                });
            }
            Some(existing) if !opts.force => {
                return Err(DispatchError::HookConflict {
                    target: target_addr.to_string(),
                    existing: existing.to_string(),
                });
            }
            _ => {}
        }

        // H2: a bead hooked by someone else is stolen only with force.
        if work.status == BeadStatus::Hooked {
            if let Some(holder) = work.assignee.as_deref() {
                if holder != target_addr.to_string() {
                    if !opts.force {
                        return Err(DispatchError::HookConflict {
                            target: holder.to_string(),
                            existing: work_bead.to_string(),
                        });
                    }
                    self.clear_holder_hook(holder, work_bead).await;
                }
            }
        }

        // Force-displacing the target's current hook releases that bead.
        if let (Some(displaced), true) = (previous_hook.as_deref(), opts.force) {
            self.release_work_bead(displaced).await;
        }

        self.beads.set_hook(&agent_bead, work_bead).await?;
        if let Err(e) = self.hook_work_bead(work_bead, &target_addr).await {
            // Roll the hook slot (and any half-applied status) back and
            // surface the original failure.
            let rollback = match previous_hook.as_deref() {
                Some(prev) => self.beads.set_hook(&agent_bead, prev).await,
                None => self.beads.clear_hook(&agent_bead).await,
            };
            if let Err(rb) = rollback {
                tracing::error!(
                    agent_bead,
                    work_bead,
                    error = %rb,
                    "hook rollback failed; H1/H2 may need manual repair"
                );
            }
            if let Err(rb) = self.beads.update_status(work_bead, work.status).await {
                tracing::warn!(work_bead, error = %rb, "status rollback failed");
            }
            return Err(e);
        }

        let convoy = self.convoy_tracking(work_bead).await;
        drop(lock);

        self.append_sling_event(work_bead, &target_addr, convoy.as_deref());

        if !opts.no_nudge {
            self.nudge_after_sling(&target_addr, work_bead, &work).await;
        }

        Ok(SlingOutcome {
            message: format!("slung {work_bead} to {target_addr}"),
            convoy,
            already_hooked: false,
        })
    }

    async fn hook_work_bead(
        &self,
        work_bead: &str,
        target: &AgentAddress,
    ) -> Result<(), DispatchError> {
        self.beads.update_status(work_bead, BeadStatus::Hooked).await?;
        self.beads.update_assignee(work_bead, &target.to_string()).await?;
        Ok(())
    }

    /// Best-effort: clear the previous holder's hook slot during a steal.
    async fn clear_holder_hook(&self, holder: &str, work_bead: &str) {
        let Ok(addr) = AgentAddress::parse(holder) else {
            tracing::warn!(holder, "cannot parse previous holder address");
            return;
        };
        let Ok(holder_bead) = self.agent_bead_id(&addr) else {
            tracing::warn!(holder, "cannot resolve previous holder bead");
            return;
        };
        match self.beads.get_slot(&holder_bead, slots::HOOK_BEAD).await {
            Ok(Some(hook)) if hook == work_bead => {
                if let Err(e) = self.beads.clear_hook(&holder_bead).await {
                    tracing::warn!(holder, error = %e, "failed to clear previous holder's hook");
                }
            }
            _ => {}
        }
    }

    /// Best-effort: a bead displaced off a hook goes back to open.
    async fn release_work_bead(&self, bead: &str) {
        if let Err(e) = self.beads.update_status(bead, BeadStatus::Open).await {
            tracing::warn!(bead, error = %e, "failed to release displaced bead");
        }
    }

    /// Open convoys whose tracked beads are all closed.
    ///
    /// Only `open` convoys participate; staged ones are deliberately left
    /// out of the scan.
    pub async fn stranded_convoys(&self) -> Result<Vec<String>, DispatchError> {
        let convoys = self
            .beads
            .list_by_type_status(gt_core::NodeType::Convoy, BeadStatus::Open)
            .await?;
        let mut stranded = Vec::new();
        for convoy in convoys {
            let deps = self.beads.list_deps(&convoy.id).await?;
            if deps.is_empty() {
                continue;
            }
            let mut all_closed = true;
            for dep in &deps {
                match self.beads.show(dep.id()).await {
                    Ok(bead) if bead.status == BeadStatus::Closed => {}
                    Ok(_) => {
                        all_closed = false;
                        break;
                    }
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e.into()),
                }
            }
            if all_closed {
                stranded.push(convoy.id);
            }
        }
        Ok(stranded)
    }

    /// First open convoy whose dependency list tracks `work_bead`.
    async fn convoy_tracking(&self, work_bead: &str) -> Option<String> {
        let convoys = self
            .beads
            .list_by_type_status(gt_core::NodeType::Convoy, BeadStatus::Open)
            .await
            .ok()?;
        for convoy in convoys {
            match self.beads.list_deps(&convoy.id).await {
                Ok(deps) => {
                    if deps.iter().any(|d| d.id() == work_bead) {
                        return Some(convoy.id);
                    }
                }
                Err(e) => {
                    tracing::debug!(convoy = %convoy.id, error = %e, "dep list failed");
                }
            }
        }
        None
    }

    fn append_sling_event(&self, work_bead: &str, target: &AgentAddress, convoy: Option<&str>) {
        let record = EventRecord::sling(&self.clock, work_bead, &target.to_string(), convoy);
        if let Err(e) = crate::events::append_event(&self.ctx.town, &record) {
            tracing::debug!(error = %e, "event append failed");
        }
    }

    /// Tell an idle target about its new work. Failures only log.
    async fn nudge_after_sling(&self, target: &AgentAddress, work_bead: &str, work: &Bead) {
        let session = target.session_name();
        match self.term.is_idle(&session).await {
            Ok(true) => {
                let message =
                    format!("New work on your hook: {work_bead} ({}). Run: gt hook show", work.title);
                if let Err(e) = self.term.nudge_session(&session, &message).await {
                    tracing::debug!(session, error = %e, "post-sling nudge failed");
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::debug!(session, error = %e, "post-sling idle check failed");
            }
        }
    }

    /// Clear the caller's (or the given agent's) hook slot.
    ///
    /// With `close_work`, a bead still in hooked state is closed (the
    /// `gt done` path). Without it the bead goes back to open for resling.
    pub async fn unhook(
        &self,
        addr: &AgentAddress,
        close_work: bool,
    ) -> Result<Option<String>, DispatchError> {
        let agent_bead = self.agent_bead_id(addr)?;
        let Some(hooked) = self.beads.get_slot(&agent_bead, slots::HOOK_BEAD).await? else {
            return Ok(None);
        };

        let _lock = self.lock_bead(&hooked)?;
        self.beads.clear_hook(&agent_bead).await?;
        if close_work {
            match self.beads.show(&hooked).await {
                Ok(work) if work.status == BeadStatus::Hooked => {
                    self.beads.update_status(&hooked, BeadStatus::Closed).await?;
                }
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        } else {
            self.release_work_bead(&hooked).await;
        }
        Ok(Some(hooked))
    }

    /// All hooked beads assigned to an address, highest priority first,
    /// oldest update first within a priority.
    pub async fn workload(&self, addr: &AgentAddress) -> Result<Vec<Bead>, DispatchError> {
        let mut beads = self.beads.list_assigned(&addr.to_string()).await?;
        beads.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.updated_at.cmp(&b.updated_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(beads)
    }

    /// Admission-control fast path.
    pub async fn count_hooked(&self, addr: &AgentAddress) -> Result<usize, DispatchError> {
        Ok(self.beads.list_assigned(&addr.to_string()).await?.len())
    }
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;

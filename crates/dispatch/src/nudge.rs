// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous message dispatch.
//!
//! Targets resolve from explicit addresses, the bare role shortcuts, or a
//! `channel:<name>` fan-out expanded against live sessions. Delivery is
//! direct keystrokes by default; `--queue` appends to the session's queue
//! file instead, `--delay` sleeps first, `--wait-ready` polls for a live
//! agent before sending. Per-target failures are collected; the overall
//! result is a failure iff at least one target failed.

use async_trait::async_trait;
use gt_adapters::TerminalBackend;
use gt_beads::BeadsGateway;
use gt_core::{filter_and_sort_sessions, AgentAddress, Clock, NotificationLevel};
use gt_refinery::{MergeSignal, MergeSignaller, SignalError};
use std::time::Duration;

use crate::channels::{pattern_matches, Channels};
use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::queue;

/// Pause between sends during a channel fan-out.
pub const CHANNEL_FANOUT_GAP: Duration = Duration::from_millis(100);

/// Default ceiling for `--wait-ready` polling.
pub const WAIT_READY_DEFAULT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMode {
    Direct,
    /// Append to the session queue file; read at the target's next tool use.
    Queued,
    Delayed(Duration),
    WaitReady,
}

#[derive(Debug, Clone)]
pub struct NudgeOptions {
    /// Bypass do-not-disturb gating.
    pub force: bool,
    pub mode: DeliveryMode,
    pub wait_timeout: Duration,
}

impl Default for NudgeOptions {
    fn default() -> Self {
        NudgeOptions {
            force: false,
            mode: DeliveryMode::Direct,
            wait_timeout: WAIT_READY_DEFAULT,
        }
    }
}

/// Per-target outcomes of one nudge invocation.
#[derive(Debug, Clone, Default)]
pub struct NudgeReport {
    pub delivered: Vec<String>,
    /// Targets skipped by do-not-disturb.
    pub muted: Vec<String>,
    pub failures: Vec<(String, String)>,
}

impl NudgeReport {
    /// Overall success: nothing failed (muted skips are not failures).
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<B, T, C> Dispatcher<B, T, C>
where
    B: BeadsGateway,
    T: TerminalBackend,
    C: Clock,
{
    /// Resolve a nudge target string into one or more addresses.
    pub async fn resolve_nudge_targets(
        &self,
        target: &str,
    ) -> Result<Vec<AgentAddress>, DispatchError> {
        if let Some(channel) = target.strip_prefix("channel:") {
            let channels = Channels::load(&self.ctx.town.channels_json());
            let patterns = channels
                .get(channel)
                .ok_or_else(|| {
                    DispatchError::UnknownAddress(format!("unknown channel: {channel}"))
                })?
                .to_vec();

            let sessions = self.term.list_sessions().await?;
            let agents = filter_and_sort_sessions(&sessions, true, &self.ctx.routes);
            let matched: Vec<AgentAddress> = agents
                .iter()
                .filter(|agent| patterns.iter().any(|p| pattern_matches(p, agent)))
                .map(|agent| agent.address.clone())
                .collect();
            return Ok(matched);
        }
        Ok(vec![self.resolve_target(target)?])
    }

    /// Send `message` to every resolved target.
    pub async fn nudge(
        &self,
        target: &str,
        message: &str,
        opts: &NudgeOptions,
    ) -> Result<NudgeReport, DispatchError> {
        let targets = self.resolve_nudge_targets(target).await?;
        let mut report = NudgeReport::default();

        for (i, addr) in targets.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(CHANNEL_FANOUT_GAP).await;
            }
            match self.deliver_one(addr, message, opts).await {
                Ok(Delivery::Sent) => report.delivered.push(addr.to_string()),
                Ok(Delivery::Muted) => report.muted.push(addr.to_string()),
                Err(e) => report.failures.push((addr.to_string(), e.to_string())),
            }
        }
        Ok(report)
    }

    async fn deliver_one(
        &self,
        addr: &AgentAddress,
        message: &str,
        opts: &NudgeOptions,
    ) -> Result<Delivery, DispatchError> {
        self.check_cancelled()?;
        if !opts.force && self.is_muted(addr).await {
            return Ok(Delivery::Muted);
        }

        let session = addr.session_name();
        match &opts.mode {
            DeliveryMode::Queued => {
                let from = self.sender_label();
                queue::queue_message(&self.ctx.town, &session, &from, message)?;
                return Ok(Delivery::Sent);
            }
            DeliveryMode::Delayed(delay) => {
                tokio::time::sleep(*delay).await;
            }
            DeliveryMode::WaitReady => {
                if !self.term.wait_for_agent_ready(&session, opts.wait_timeout).await? {
                    return Err(DispatchError::Timeout(opts.wait_timeout));
                }
            }
            DeliveryMode::Direct => {}
        }
        self.term.nudge_session(&session, message).await?;
        Ok(Delivery::Sent)
    }

    /// DND check against the target's agent bead; a missing bead or store
    /// hiccup never blocks delivery.
    async fn is_muted(&self, addr: &AgentAddress) -> bool {
        let Ok(bead_id) = self.agent_bead_id(addr) else {
            return false;
        };
        match self.beads.show(&bead_id).await {
            Ok(bead) => bead.as_agent().notification_level() == NotificationLevel::Muted,
            Err(_) => false,
        }
    }

    pub(crate) fn sender_label(&self) -> String {
        self.ctx
            .identity
            .as_ref()
            .map(|i| i.address.to_string())
            .unwrap_or_else(|| "mayor".to_string())
    }
}

enum Delivery {
    Sent,
    Muted,
}

/// Merge cascade signals deliver as direct nudges to the worker.
#[async_trait]
impl<B, T, C> MergeSignaller for Dispatcher<B, T, C>
where
    B: BeadsGateway,
    T: TerminalBackend,
    C: Clock,
{
    async fn signal(&self, worker: &str, signal: MergeSignal) -> Result<(), SignalError> {
        let addr = AgentAddress::parse(worker).map_err(|e| SignalError(e.to_string()))?;
        self.term
            .nudge_session(&addr.session_name(), &signal.to_string())
            .await
            .map_err(|e| SignalError(e.to_string()))
    }
}

#[cfg(test)]
#[path = "nudge_tests.rs"]
mod tests;

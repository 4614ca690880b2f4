// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Town restart sweeps.
//!
//! `down` stops every live Gas Town session in scope; `up` starts the
//! configured set (town singletons plus each rig's witness, refinery, and
//! crews) and, when restoring, re-opens sessions for polecats whose agent
//! bead still has a hook. Drain waits for every polecat hook to empty
//! before stopping; immediate skips all waiting.

use gt_adapters::TerminalBackend;
use gt_beads::{BeadsGateway, BeadStatus};
use gt_core::{filter_and_sort_sessions, AgentAddress, Clock, NodeType, Role};
use std::time::Duration;

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;

/// How long drain waits for polecat hooks to empty.
pub const DRAIN_DEADLINE: Duration = Duration::from_secs(30 * 60);
/// Drain polling interval.
pub const DRAIN_POLL: Duration = Duration::from_secs(5);

/// Command every restarted agent session runs.
const AGENT_COMMAND: &str = "claude";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartStrategy {
    /// Stop everything, start the configured set, restore polecat hooks.
    #[default]
    Graceful,
    /// Wait for polecat hooks to empty first, then graceful.
    Drain,
    /// Hard kill, then start the configured set.
    Immediate,
    /// Stop everything and start fresh without restoring.
    Clean,
}

gt_core::simple_display! {
    RestartStrategy {
        Graceful => "graceful",
        Drain => "drain",
        Immediate => "immediate",
        Clean => "clean",
    }
}

impl RestartStrategy {
    pub fn parse(s: &str) -> Option<RestartStrategy> {
        match s {
            "graceful" => Some(RestartStrategy::Graceful),
            "drain" => Some(RestartStrategy::Drain),
            "immediate" => Some(RestartStrategy::Immediate),
            "clean" => Some(RestartStrategy::Clean),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RestartOptions {
    pub strategy: RestartStrategy,
    /// Restrict to town singletons and rig singletons.
    pub infra_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RestartReport {
    pub stopped: Vec<String>,
    pub started: Vec<String>,
    /// Polecat sessions re-opened because their bead still has a hook.
    pub restored: Vec<String>,
    pub failures: Vec<(String, String)>,
}

impl<B, T, C> Dispatcher<B, T, C>
where
    B: BeadsGateway,
    T: TerminalBackend,
    C: Clock,
{
    /// Full restart per the chosen strategy.
    pub async fn restart(&self, opts: &RestartOptions) -> Result<RestartReport, DispatchError> {
        self.check_cancelled()?;
        let mut report = RestartReport::default();

        if opts.strategy == RestartStrategy::Drain {
            self.wait_for_polecats_drained().await?;
        }

        self.stop_all(opts, &mut report).await?;
        self.start_configured(opts, &mut report).await?;

        let restore = matches!(
            opts.strategy,
            RestartStrategy::Graceful | RestartStrategy::Drain | RestartStrategy::Immediate
        );
        if restore && !opts.infra_only {
            self.restore_polecats(&mut report).await?;
        }
        Ok(report)
    }

    /// `gt down`: stop live sessions in scope.
    pub async fn down(&self, opts: &RestartOptions) -> Result<RestartReport, DispatchError> {
        let mut report = RestartReport::default();
        self.stop_all(opts, &mut report).await?;
        Ok(report)
    }

    /// `gt up`: start the configured set (no restore).
    pub async fn up(&self, opts: &RestartOptions) -> Result<RestartReport, DispatchError> {
        let mut report = RestartReport::default();
        self.start_configured(opts, &mut report).await?;
        Ok(report)
    }

    async fn stop_all(
        &self,
        opts: &RestartOptions,
        report: &mut RestartReport,
    ) -> Result<(), DispatchError> {
        let sessions = self.term.list_sessions().await?;
        let agents = filter_and_sort_sessions(&sessions, true, &self.ctx.routes);
        for agent in agents {
            if opts.infra_only && !agent.role.is_infra() {
                continue;
            }
            match self.term.kill_session(&agent.session).await {
                Ok(()) => report.stopped.push(agent.session),
                Err(e) => report.failures.push((agent.session, e.to_string())),
            }
        }
        Ok(())
    }

    /// Start town singletons plus every rig's singleton and crew set.
    async fn start_configured(
        &self,
        opts: &RestartOptions,
        report: &mut RestartReport,
    ) -> Result<(), DispatchError> {
        let mut targets = vec![AgentAddress::Mayor, AgentAddress::Deacon];
        let rigs = gt_core::Rigs::load(&self.ctx.town.rigs_json()).unwrap_or_default();
        for (rig, entry) in &rigs.rigs {
            targets.push(AgentAddress::Witness { rig: rig.to_string() });
            targets.push(AgentAddress::Refinery { rig: rig.to_string() });
            if !opts.infra_only {
                for crew in &entry.crews {
                    targets.push(AgentAddress::Crew {
                        rig: rig.to_string(),
                        name: crew.clone(),
                    });
                }
            }
        }

        for addr in targets {
            match self.start_agent(&addr).await {
                Ok(()) => report.started.push(addr.session_name()),
                Err(e) => report.failures.push((addr.session_name(), e.to_string())),
            }
        }
        Ok(())
    }

    /// Launch one agent session with its identity environment.
    async fn start_agent(&self, addr: &AgentAddress) -> Result<(), DispatchError> {
        let session = addr.session_name();
        if self.term.has_session(&session).await? {
            return Ok(());
        }
        let workdir = match addr.rig() {
            Some(rig) => self.ctx.town.rig_dir(rig),
            None => self.ctx.town.root().to_path_buf(),
        };
        self.term.new_session(&session, &workdir, AGENT_COMMAND).await?;
        self.term.set_env(&session, "GT_ROLE", &addr.role().to_string()).await?;
        if let Some(rig) = addr.rig() {
            self.term.set_env(&session, "GT_RIG", rig).await?;
        }
        match addr {
            AgentAddress::Polecat { name, .. } => {
                self.term.set_env(&session, "GT_POLECAT", name).await?;
            }
            AgentAddress::Crew { name, .. } => {
                self.term.set_env(&session, "GT_CREW", name).await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Re-open sessions for polecats whose agent bead still has a hook.
    async fn restore_polecats(&self, report: &mut RestartReport) -> Result<(), DispatchError> {
        for (addr, _) in self.hooked_polecats().await? {
            match self.start_agent(&addr).await {
                Ok(()) => report.restored.push(addr.session_name()),
                Err(e) => report.failures.push((addr.session_name(), e.to_string())),
            }
        }
        Ok(())
    }

    /// Polecat agent beads with a non-empty hook, as (address, hook) pairs.
    async fn hooked_polecats(&self) -> Result<Vec<(AgentAddress, String)>, DispatchError> {
        let beads = self
            .beads
            .list_by_type_status(NodeType::Agent, BeadStatus::Open)
            .await?;
        let mut hooked = Vec::new();
        for bead in beads {
            let agent = bead.as_agent();
            if agent.role() != Some(Role::Polecat) {
                continue;
            }
            let Some(hook) = agent.hook_bead() else { continue };
            let Some(rig) = agent.rig() else { continue };
            // Bead id shape: <prefix>-<rig>-polecat-<name>
            let Some(name) = bead
                .id
                .split("-polecat-")
                .nth(1)
                .filter(|n| !n.is_empty())
            else {
                tracing::debug!(bead = %bead.id, "polecat bead without name suffix");
                continue;
            };
            hooked.push((
                AgentAddress::Polecat { rig: rig.to_string(), name: name.to_string() },
                hook.to_string(),
            ));
        }
        Ok(hooked)
    }

    /// Poll until no polecat holds a hook, or the drain deadline passes.
    async fn wait_for_polecats_drained(&self) -> Result<(), DispatchError> {
        let deadline = tokio::time::Instant::now() + DRAIN_DEADLINE;
        loop {
            let hooked = self.hooked_polecats().await?;
            if hooked.is_empty() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DispatchError::Timeout(DRAIN_DEADLINE));
            }
            tracing::info!(remaining = hooked.len(), "draining polecat hooks");
            tokio::time::sleep(DRAIN_POLL).await;
        }
    }
}

#[cfg(test)]
#[path = "restart_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account-quota rotation.
//!
//! Scan classifies each live session's pane against the rate-limit
//! patterns and resolves which account it runs on. Plan assigns limited
//! sessions to available accounts, least recently used first. Execute
//! swaps the credential into the session's config dir, rewrites the
//! account identity, and respawns the pane with `--continue` so the
//! conversation survives. Sessions sharing a config dir rotate together:
//! one credential write serves them all.

use chrono::{DateTime, Utc};
use gt_adapters::TerminalBackend;
use gt_beads::BeadsGateway;
use gt_core::{AgentAddress, Clock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::credentials;
use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;

/// Pane fragments that mean "this session is rate limited".
const RATE_LIMIT_PATTERNS: &[&str] = &[
    "usage limit reached",
    "you've reached your usage limit",
    "rate limit",
    "out of extended usage",
];

/// Extracts the reset time from lines like "resets at 7pm" / "Resets 10:30am".
static RESETS_AT: LazyLock<regex::Regex> = LazyLock::new(|| {
    // The pattern is a literal; failure here is a programming error.
    match regex::Regex::new(r"(?i)resets?\s+(?:at\s+)?(\d{1,2}(?::\d{2})?\s*(?:am|pm)?)") {
        Ok(re) => re,
        Err(_) => unreachable!("invalid resets-at pattern"),
    }
});

/// Command a rotated pane restarts with. `--continue` reattaches the
/// conversation stored under the (unchanged) config dir.
const RESPAWN_COMMAND: &str = "claude --continue";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaStatus {
    Available,
    Limited,
    Cooldown,
    #[default]
    Unknown,
}

gt_core::simple_display! {
    QuotaStatus {
        Available => "available",
        Limited => "limited",
        Cooldown => "cooldown",
        Unknown => "unknown",
    }
}

/// One credential identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub handle: String,
    #[serde(default)]
    pub email: String,
    pub config_dir: PathBuf,
    #[serde(default)]
    pub status: QuotaStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limited_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

/// The account roster from `mayor/accounts.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Accounts {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl Accounts {
    pub fn load(path: &Path) -> Result<Accounts, DispatchError> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                DispatchError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Accounts::default()),
            Err(e) => Err(DispatchError::Io(e)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), DispatchError> {
        gt_core::town::write_json_atomic(path, self)?;
        Ok(())
    }

    pub fn by_handle(&self, handle: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.handle == handle)
    }

    fn by_config_dir(&self, dir: &Path) -> Option<&Account> {
        self.accounts.iter().find(|a| a.config_dir == dir)
    }

    /// Available accounts, least recently used first.
    pub fn available_lru(&self) -> Vec<&Account> {
        let mut available: Vec<&Account> = self
            .accounts
            .iter()
            .filter(|a| a.status == QuotaStatus::Available)
            .collect();
        available.sort_by(|a, b| {
            a.last_used
                .cmp(&b.last_used)
                .then_with(|| a.handle.cmp(&b.handle))
        });
        available
    }

    /// Mark the named accounts available; with none given, clear every
    /// limited or cooldown account.
    pub fn clear(&mut self, handles: &[String]) -> Vec<String> {
        let mut cleared = Vec::new();
        for account in &mut self.accounts {
            let matches = if handles.is_empty() {
                matches!(account.status, QuotaStatus::Limited | QuotaStatus::Cooldown)
            } else {
                handles.iter().any(|h| *h == account.handle)
            };
            if matches && account.status != QuotaStatus::Available {
                account.status = QuotaStatus::Available;
                account.limited_at = None;
                account.resets_at = None;
                cleared.push(account.handle.clone());
            }
        }
        cleared
    }
}

/// One session's scan classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub session: String,
    pub limited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<String>,
    /// Account handle resolved from env or config dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
}

/// One planned reassignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationMove {
    pub session: String,
    pub config_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_handle: Option<String>,
    pub to_handle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RotationPlan {
    pub moves: Vec<RotationMove>,
    /// Limited sessions that could not be planned (no config dir or no
    /// account left).
    pub unplanned: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RotationReport {
    pub rotated: Vec<RotationMove>,
    pub failures: Vec<(String, String)>,
}

/// Classify one pane capture.
pub fn classify_pane(pane: &str) -> (bool, Option<String>) {
    let lowered = pane.to_ascii_lowercase();
    let limited = RATE_LIMIT_PATTERNS.iter().any(|p| lowered.contains(p));
    let resets_at = RESETS_AT
        .captures(pane)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());
    (limited, resets_at)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RotateOptions<'a> {
    /// Preemptively rotate sessions on this handle (and only those).
    pub from: Option<&'a str>,
    /// Skip sessions that are not currently idle.
    pub idle_only: bool,
    pub dry_run: bool,
}

impl<B, T, C> Dispatcher<B, T, C>
where
    B: BeadsGateway,
    T: TerminalBackend,
    C: Clock,
{
    /// Capture and classify every Gas Town session.
    pub async fn quota_scan(&self, accounts: &Accounts) -> Result<Vec<ScanResult>, DispatchError> {
        let sessions = self.term.list_sessions().await?;
        let mut results = Vec::new();
        for session in sessions {
            if AgentAddress::from_session(&session, &self.ctx.routes).is_none() {
                continue;
            }
            let pane = match self.term.capture_pane(&session, 120).await {
                Ok(pane) => pane,
                Err(e) => {
                    tracing::debug!(session, error = %e, "pane capture failed");
                    continue;
                }
            };
            let (limited, resets_at) = classify_pane(&pane);

            let config_dir = self
                .term
                .get_env(&session, "CLAUDE_CONFIG_DIR")
                .await
                .ok()
                .flatten()
                .map(PathBuf::from);
            let account = match self.term.get_env(&session, "GT_QUOTA_ACCOUNT").await {
                Ok(Some(handle)) if !handle.is_empty() => Some(handle),
                _ => config_dir
                    .as_deref()
                    .and_then(|dir| accounts.by_config_dir(dir))
                    .map(|a| a.handle.clone()),
            };

            results.push(ScanResult { session, limited, resets_at, account, config_dir });
        }
        Ok(results)
    }

    /// Persist detected-limited status back onto the roster.
    pub fn apply_scan(&self, accounts: &mut Accounts, scans: &[ScanResult]) -> Vec<String> {
        let mut marked = Vec::new();
        for scan in scans.iter().filter(|s| s.limited) {
            let Some(handle) = &scan.account else { continue };
            if let Some(account) = accounts.accounts.iter_mut().find(|a| a.handle == *handle) {
                if account.status != QuotaStatus::Limited {
                    account.status = QuotaStatus::Limited;
                    account.limited_at = Some(self.clock.utc());
                    marked.push(account.handle.clone());
                }
                account.resets_at = scan.resets_at.clone();
            }
        }
        marked
    }

    /// Assign rate-limited sessions to available accounts.
    pub async fn quota_plan(
        &self,
        scans: &[ScanResult],
        accounts: &Accounts,
        opts: &RotateOptions<'_>,
    ) -> Result<RotationPlan, DispatchError> {
        let mut plan = RotationPlan::default();

        // Sessions sharing a config dir rotate as one unit.
        let mut groups: BTreeMap<PathBuf, Vec<&ScanResult>> = BTreeMap::new();
        for scan in scans {
            let eligible = match opts.from {
                // Preemptive rotation targets that handle only.
                Some(from) => scan.account.as_deref() == Some(from),
                None => scan.limited,
            };
            if !eligible {
                continue;
            }
            if opts.idle_only && !self.term.is_idle(&scan.session).await.unwrap_or(false) {
                continue;
            }
            match &scan.config_dir {
                Some(dir) => groups.entry(dir.clone()).or_default().push(scan),
                None => plan.unplanned.push(scan.session.clone()),
            }
        }

        // An account cannot rotate into the dir it already owns.
        let eligible: Vec<&Account> = accounts
            .available_lru()
            .into_iter()
            .filter(|a| !groups.contains_key(&a.config_dir))
            .collect();

        let mut used: std::collections::BTreeSet<&str> = std::collections::BTreeSet::new();
        for (dir, scans) in &groups {
            let current: std::collections::BTreeSet<&str> =
                scans.iter().filter_map(|s| s.account.as_deref()).collect();
            // LRU-first account not already taken and not the one these
            // sessions are on.
            let pick = eligible.iter().find(|a| {
                !used.contains(a.handle.as_str()) && !current.contains(a.handle.as_str())
            });
            match pick {
                Some(account) => {
                    used.insert(&account.handle);
                    for scan in scans {
                        plan.moves.push(RotationMove {
                            session: scan.session.clone(),
                            config_dir: dir.clone(),
                            from_handle: scan.account.clone(),
                            to_handle: account.handle.clone(),
                        });
                    }
                }
                None => {
                    plan.unplanned.extend(scans.iter().map(|s| s.session.clone()));
                }
            }
        }
        Ok(plan)
    }

    /// Execute a rotation plan.
    ///
    /// Credential work happens once per config dir; each session in the
    /// group is then respawned in place. A failed step leaves the earlier
    /// steps in place and records the failure.
    pub async fn quota_execute(
        &self,
        plan: &RotationPlan,
        accounts: &mut Accounts,
        dry_run: bool,
    ) -> Result<RotationReport, DispatchError> {
        self.check_cancelled()?;
        let mut report = RotationReport::default();
        if dry_run {
            report.rotated = plan.moves.clone();
            return Ok(report);
        }

        let mut groups: BTreeMap<PathBuf, Vec<&RotationMove>> = BTreeMap::new();
        for mv in &plan.moves {
            groups.entry(mv.config_dir.clone()).or_default().push(mv);
        }

        for (dir, moves) in groups {
            let to_handle = moves[0].to_handle.clone();
            let Some(account) = accounts.by_handle(&to_handle).cloned() else {
                for mv in &moves {
                    report
                        .failures
                        .push((mv.session.clone(), format!("unknown account {to_handle}")));
                }
                continue;
            };

            if let Err(e) = self.swap_credentials(&account, &dir) {
                for mv in &moves {
                    report.failures.push((mv.session.clone(), e.to_string()));
                }
                continue;
            }

            for mv in &moves {
                match self.respawn_rotated(&mv.session, &to_handle).await {
                    Ok(()) => report.rotated.push((*mv).clone()),
                    Err(e) => report.failures.push((mv.session.clone(), e.to_string())),
                }
            }

            if let Some(account) = accounts.accounts.iter_mut().find(|a| a.handle == to_handle) {
                account.last_used = Some(self.clock.utc());
            }
        }
        Ok(report)
    }

    /// Steps 1–2: copy the new account's credential and identity into the
    /// session's config dir.
    fn swap_credentials(&self, account: &Account, target_dir: &Path) -> Result<(), DispatchError> {
        let blob = credentials::read_credential(&account.config_dir)?;
        credentials::write_credential(target_dir, &blob)?;
        credentials::copy_oauth_account(&account.config_dir, target_dir)?;
        Ok(())
    }

    /// Steps 3–4: mark the session with its new handle, clear history,
    /// and respawn the pane with the same config dir and `--continue`.
    async fn respawn_rotated(&self, session: &str, handle: &str) -> Result<(), DispatchError> {
        self.term.set_env(session, "GT_QUOTA_ACCOUNT", handle).await?;
        self.term.clear_history(session).await?;
        self.term.respawn_pane(session, RESPAWN_COMMAND).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "quota_tests.rs"]
mod tests;

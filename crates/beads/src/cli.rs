// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bd` CLI implementation of the gateway.
//!
//! Each operation is one `bd` invocation with `--json` output against the
//! store directory the bead id routes to: rig prefixes map through the
//! routes table, everything else lands in the town store. Mail and the two
//! town singletons are pinned to the town store regardless of prefix, so a
//! rig that chose the `gt` prefix cannot shadow them.

use async_trait::async_trait;
use gt_core::{NodeType, Routes, Town};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::bead::{slots, Bead, BeadRef, BeadStatus, CreateBead, StoreScope};
use crate::error::BeadsError;
use crate::gateway::BeadsGateway;

/// Gateway backed by the `bd` binary.
#[derive(Debug, Clone)]
pub struct BdCli {
    town: Town,
    routes: Routes,
    bd_bin: String,
    cancel: CancellationToken,
}

impl BdCli {
    pub fn new(town: Town, routes: Routes) -> BdCli {
        BdCli {
            town,
            routes,
            bd_bin: "bd".to_string(),
            cancel: CancellationToken::new(),
        }
    }

    /// Thread a cancellation token through every store call.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> BdCli {
        self.cancel = cancel;
        self
    }

    #[cfg(test)]
    fn with_bd_bin(mut self, bin: &str) -> BdCli {
        self.bd_bin = bin.to_string();
        self
    }

    /// Store directory a bead id routes to.
    fn store_dir(&self, id: &str) -> PathBuf {
        if id == "gt-mayor" || id == "gt-deacon" || id.starts_with("gt-mail-") {
            return self.town.beads_dir();
        }
        let prefix = id.split('-').next().unwrap_or_default();
        match self.routes.rig_for_prefix(prefix) {
            Some(rig) => self.town.rig_beads_dir(rig),
            None => self.town.beads_dir(),
        }
    }

    fn scope_dir(&self, scope: &StoreScope) -> PathBuf {
        match scope {
            StoreScope::Town => self.town.beads_dir(),
            StoreScope::Rig(rig) => self.town.rig_beads_dir(rig),
        }
    }

    /// Every reachable store directory: the town's plus one per routed rig.
    fn all_store_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.town.beads_dir()];
        dirs.extend(self.routes.rigs().map(|rig| self.town.rig_beads_dir(rig)));
        dirs
    }

    /// Run `bd` against a store and return stdout.
    ///
    /// A missing `subject` bead comes back as `NotFound`; any other failure
    /// is `Unavailable`. Cancellation wins the race but never kills a write
    /// that has already been handed to the store.
    async fn run(
        &self,
        store: &Path,
        subject: Option<&str>,
        args: &[&str],
    ) -> Result<String, BeadsError> {
        if self.cancel.is_cancelled() {
            return Err(BeadsError::Cancelled);
        }
        let mut cmd = tokio::process::Command::new(&self.bd_bin);
        cmd.arg("--store").arg(store).args(args);

        let output = tokio::select! {
            out = cmd.output() => {
                out.map_err(|e| BeadsError::Unavailable(format!("failed to run bd: {e}")))?
            }
            _ = self.cancel.cancelled() => return Err(BeadsError::Cancelled),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.to_ascii_lowercase().contains("not found") {
                return Err(BeadsError::NotFound(subject.unwrap_or_default().to_string()));
            }
            return Err(BeadsError::Unavailable(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn parse_bead(raw: &str) -> Result<Bead, BeadsError> {
        serde_json::from_str(raw).map_err(|e| BeadsError::Malformed(e.to_string()))
    }

    fn parse_beads(raw: &str) -> Result<Vec<Bead>, BeadsError> {
        serde_json::from_str(raw).map_err(|e| BeadsError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl BeadsGateway for BdCli {
    async fn show(&self, id: &str) -> Result<Bead, BeadsError> {
        let store = self.store_dir(id);
        let raw = self.run(&store, Some(id), &["show", id, "--json"]).await?;
        Self::parse_bead(&raw)
    }

    async fn list_by_type_status(
        &self,
        bead_type: NodeType,
        status: BeadStatus,
    ) -> Result<Vec<Bead>, BeadsError> {
        let type_arg = bead_type.to_string();
        let status_arg = status.to_string();
        let mut all = Vec::new();
        for store in self.all_store_dirs() {
            if !store.is_dir() {
                continue;
            }
            let raw = self
                .run(
                    &store,
                    None,
                    &["list", "--type", &type_arg, "--status", &status_arg, "--json"],
                )
                .await?;
            all.extend(Self::parse_beads(&raw)?);
        }
        Ok(all)
    }

    async fn get_slot(&self, id: &str, slot: &str) -> Result<Option<String>, BeadsError> {
        let store = self.store_dir(id);
        let raw = self.run(&store, Some(id), &["slot", "get", id, slot]).await?;
        let value = raw.trim();
        Ok(if value.is_empty() { None } else { Some(value.to_string()) })
    }

    async fn set_slot(&self, id: &str, slot: &str, value: &str) -> Result<(), BeadsError> {
        let store = self.store_dir(id);
        self.run(&store, Some(id), &["slot", "set", id, slot, value]).await?;
        Ok(())
    }

    async fn set_hook(&self, agent_bead: &str, work_bead: &str) -> Result<(), BeadsError> {
        self.set_slot(agent_bead, slots::HOOK_BEAD, work_bead).await
    }

    async fn clear_hook(&self, agent_bead: &str) -> Result<(), BeadsError> {
        self.set_slot(agent_bead, slots::HOOK_BEAD, "").await
    }

    async fn list_deps(&self, id: &str) -> Result<Vec<BeadRef>, BeadsError> {
        let store = self.store_dir(id);
        let raw = self.run(&store, Some(id), &["dep", "list", id, "--json"]).await?;
        let entries: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| BeadsError::Malformed(e.to_string()))?;
        Ok(entries.iter().map(|s| BeadRef::parse(s)).collect())
    }

    async fn create_or_reopen_agent_bead(
        &self,
        id: &str,
        title: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), BeadsError> {
        match self.show(id).await {
            Ok(bead) => {
                if bead.status == BeadStatus::Closed {
                    self.update_status(id, BeadStatus::Open).await?;
                }
            }
            Err(e) if e.is_not_found() => {
                let store = self.store_dir(id);
                self.run(
                    &store,
                    None,
                    &["create", "--id", id, "--type", "agent", "--title", title, "--json"],
                )
                .await?;
            }
            Err(e) => return Err(e),
        }
        for (key, value) in fields {
            self.set_slot(id, key, value).await?;
        }
        Ok(())
    }

    async fn create(&self, req: CreateBead) -> Result<Bead, BeadsError> {
        let store = self.scope_dir(&req.scope);
        let type_arg = req.bead_type.to_string();
        let priority_arg = req.priority.to_string();
        let mut args: Vec<&str> = vec![
            "create",
            "--type",
            &type_arg,
            "--title",
            &req.title,
            "--priority",
            &priority_arg,
            "--json",
        ];
        if !req.description.is_empty() {
            args.push("--description");
            args.push(req.description.as_str());
        }
        for label in &req.labels {
            args.push("--label");
            args.push(label.as_str());
        }
        let raw = self.run(&store, None, &args).await?;
        let bead = Self::parse_bead(&raw)?;
        for (key, value) in &req.slots {
            self.set_slot(&bead.id, key, value).await?;
        }
        self.show(&bead.id).await
    }

    async fn update_status(&self, id: &str, status: BeadStatus) -> Result<(), BeadsError> {
        let store = self.store_dir(id);
        self.run(&store, Some(id), &["update", id, "--status", &status.to_string()]).await?;
        Ok(())
    }

    async fn update_assignee(&self, id: &str, assignee: &str) -> Result<(), BeadsError> {
        let store = self.store_dir(id);
        self.run(&store, Some(id), &["update", id, "--assignee", assignee]).await?;
        Ok(())
    }

    async fn list_assigned(&self, assignee: &str) -> Result<Vec<Bead>, BeadsError> {
        let mut all = Vec::new();
        for store in self.all_store_dirs() {
            if !store.is_dir() {
                tracing::debug!(store = %store.display(), "skipping unreadable store");
                continue;
            }
            let raw = self
                .run(
                    &store,
                    None,
                    &["list", "--assignee", assignee, "--status", "hooked", "--json"],
                )
                .await?;
            all.extend(Self::parse_beads(&raw)?);
        }
        Ok(all)
    }

    async fn list_mail(&self, to: &str, unread_only: bool) -> Result<Vec<Bead>, BeadsError> {
        let store = self.town.beads_dir();
        let to_label = format!("to:{to}");
        let mut args = vec!["list", "--type", "message", "--label", to_label.as_str()];
        if unread_only {
            args.extend_from_slice(&["--status", "open"]);
        }
        args.push("--json");
        let raw = self.run(&store, None, &args).await?;
        Self::parse_beads(&raw)
    }

    async fn mark_read(&self, id: &str) -> Result<(), BeadsError> {
        self.update_status(id, BeadStatus::Closed).await
    }

    async fn close(&self, id: &str) -> Result<(), BeadsError> {
        self.update_status(id, BeadStatus::Closed).await
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbox over mail beads, with the unread-count cache.
//!
//! Messages are beads of type `message` in the town store, addressed by
//! `to:`/`from:` labels. `check` memoises the unread count for 30 seconds
//! in a per-address JSON file so tool-post hooks can poll cheaply; a torn
//! or stale cache entry reads as absent and forces a store round trip.

use chrono::{DateTime, Utc};
use gt_adapters::TerminalBackend;
use gt_beads::{slots, Bead, BeadsGateway, CreateBead, StoreScope};
use gt_core::{AgentAddress, Clock, Town};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;

/// How long a cached unread count stays valid.
pub const MAIL_CACHE_TTL: Duration = Duration::from_secs(30);

/// Wire shape of the cache file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailCacheEntry {
    pub timestamp: DateTime<Utc>,
    pub address: String,
    pub unread: usize,
    pub subjects: Vec<String>,
}

/// Result of a mail check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailSummary {
    pub address: String,
    pub unread: usize,
    pub subjects: Vec<String>,
    /// IDs of the unread messages (empty when served from cache).
    pub ids: Vec<String>,
    pub from_cache: bool,
}

/// Request shape for sending.
#[derive(Debug, Clone)]
pub struct SendMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub priority: u8,
}

pub(crate) fn cache_path(address: &str) -> PathBuf {
    Town::mail_cache_dir().join(format!("{}.json", gt_core::sanitize_filename(address)))
}

/// Load a cache entry if it is fresh and keyed to `address`.
pub fn load_cached<C: Clock>(address: &str, clock: &C) -> Option<MailCacheEntry> {
    let content = std::fs::read_to_string(cache_path(address)).ok()?;
    let entry: MailCacheEntry = serde_json::from_str(&content).ok()?;
    if entry.address != address {
        return None;
    }
    let age = clock.utc().signed_duration_since(entry.timestamp);
    if age < chrono::TimeDelta::zero() || age.num_seconds() as u64 > MAIL_CACHE_TTL.as_secs() {
        return None;
    }
    Some(entry)
}

fn save_cache(entry: &MailCacheEntry) {
    if let Err(e) = gt_core::town::write_json_atomic(&cache_path(&entry.address), entry) {
        tracing::debug!(error = %e, "mail cache write failed");
    }
}

impl<B, T, C> Dispatcher<B, T, C>
where
    B: BeadsGateway,
    T: TerminalBackend,
    C: Clock,
{
    /// Send a message; returns the new mail bead's id.
    pub async fn send_mail(&self, req: &SendMail) -> Result<String, DispatchError> {
        let to = self.resolve_target(&req.to)?;
        let from = self.sender_label();

        let mut create = CreateBead::new(
            StoreScope::Town,
            gt_core::NodeType::Message,
            req.subject.clone(),
        );
        create.description = req.body.clone();
        create.priority = req.priority;
        create.labels = vec![format!("to:{to}"), format!("from:{from}")];
        create.slots.insert(slots::MAIL_TO.to_string(), to.to_string());
        create.slots.insert(slots::MAIL_FROM.to_string(), from.clone());

        let bead = self.beads.create(create).await?;
        // The recipient's cached unread count is stale now.
        let _ = std::fs::remove_file(cache_path(&to.to_string()));
        Ok(bead.id)
    }

    /// Unread summary for an address, via the 30 s cache.
    pub async fn check_mail(&self, addr: &AgentAddress) -> Result<MailSummary, DispatchError> {
        let address = addr.to_string();
        if let Some(entry) = load_cached(&address, &self.clock) {
            return Ok(MailSummary {
                address,
                unread: entry.unread,
                subjects: entry.subjects,
                ids: Vec::new(),
                from_cache: true,
            });
        }

        let unread = self.beads.list_mail(&address, true).await?;
        let subjects: Vec<String> = unread.iter().map(|m| m.title.clone()).collect();
        let ids: Vec<String> = unread.iter().map(|m| m.id.clone()).collect();
        save_cache(&MailCacheEntry {
            timestamp: self.clock.utc(),
            address: address.clone(),
            unread: unread.len(),
            subjects: subjects.clone(),
        });
        Ok(MailSummary {
            address,
            unread: unread.len(),
            subjects,
            ids,
            from_cache: false,
        })
    }

    /// Full inbox listing, read or unread.
    pub async fn inbox(
        &self,
        addr: &AgentAddress,
        unread_only: bool,
    ) -> Result<Vec<Bead>, DispatchError> {
        let mut mail = self.beads.list_mail(&addr.to_string(), unread_only).await?;
        mail.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(mail)
    }

    /// Read one message and mark it read.
    pub async fn read_mail(&self, id: &str) -> Result<Bead, DispatchError> {
        let bead = self.beads.show(id).await?;
        self.beads.mark_read(id).await?;
        if let Some(to) = bead.slot(slots::MAIL_TO) {
            let _ = std::fs::remove_file(cache_path(to));
        }
        Ok(bead)
    }
}

/// The `--inject` system-reminder block: tells an agent about unread mail
/// from a tool-post hook without waking it.
pub fn inject_block(summary: &MailSummary) -> String {
    let mut block = String::from("<system-reminder>\n");
    block.push_str(&format!(
        "You have {} unread message(s):\n",
        summary.unread
    ));
    for (i, subject) in summary.subjects.iter().enumerate() {
        match summary.ids.get(i) {
            Some(id) => block.push_str(&format!("- {id}: {subject}\n")),
            None => block.push_str(&format!("- {subject}\n")),
        }
    }
    block.push_str("Run `gt mail inbox` to read them.\n</system-reminder>");
    block
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only dispatcher event log.
//!
//! One JSON line per record under `.gastown/events.jsonl`. Best-effort:
//! callers log append failures and move on; the event log is feedback, not
//! state.

use chrono::{DateTime, Utc};
use gt_core::{Clock, Town};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub id: String,
    pub ts: DateTime<Utc>,
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bead: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convoy: Option<String>,
}

impl EventRecord {
    pub fn sling<C: Clock>(
        clock: &C,
        bead: &str,
        target: &str,
        convoy: Option<&str>,
    ) -> EventRecord {
        EventRecord {
            id: uuid::Uuid::new_v4().to_string(),
            ts: clock.utc(),
            op: "sling".to_string(),
            bead: Some(bead.to_string()),
            target: Some(target.to_string()),
            convoy: convoy.map(str::to_string),
        }
    }
}

/// Append one record to the town's event log.
pub fn append_event(town: &Town, record: &EventRecord) -> std::io::Result<()> {
    let path = town.events_file();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let line = serde_json::to_string(record)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;

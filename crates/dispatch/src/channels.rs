// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Town channel table and target patterns.
//!
//! `mayor/channels.json` maps a channel name to a pattern list. A pattern
//! is one of:
//!
//! - an exact address (`gastown/witness`, `mayor`)
//! - `<rig>/polecats/*`: every polecat of a rig
//! - `<rig>/crew/*`: every crew member of a rig
//! - `<rig>/*`: every agent of a rig
//! - `*/witness`, `*/refinery`: that singleton in every rig
//!
//! Patterns match against *live* sessions; expansion happens in the nudge
//! path where the session list is available.

use gt_core::{AgentInfo, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The channel table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channels {
    #[serde(default)]
    channels: BTreeMap<String, Vec<String>>,
}

impl Channels {
    /// Load the table; a missing file is an empty table.
    pub fn load(path: &Path) -> Channels {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "malformed channels.json; using empty table");
                Channels::default()
            }),
            Err(_) => Channels::default(),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        gt_core::town::write_json_atomic(path, self)
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.channels.get(name).map(Vec::as_slice)
    }

    pub fn insert(&mut self, name: &str, patterns: Vec<String>) {
        self.channels.insert(name.to_string(), patterns);
    }
}

/// Does a pattern select this live agent?
pub fn pattern_matches(pattern: &str, agent: &AgentInfo) -> bool {
    if pattern == agent.address.to_string() {
        return true;
    }
    let Some((scope, tail)) = pattern.split_once('/') else {
        return false;
    };
    let rig_matches = |agent: &AgentInfo| {
        scope == "*" || agent.rig.as_deref() == Some(scope)
    };
    match tail {
        "*" => scope != "*" && agent.rig.as_deref() == Some(scope),
        "polecats/*" => agent.role == Role::Polecat && rig_matches(agent),
        "crew/*" => agent.role == Role::Crew && rig_matches(agent),
        "witness" => agent.role == Role::Witness && rig_matches(agent),
        "refinery" => agent.role == Role::Refinery && rig_matches(agent),
        _ => false,
    }
}

#[cfg(test)]
#[path = "channels_tests.rs"]
mod tests;

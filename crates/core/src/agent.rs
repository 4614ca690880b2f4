// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent bead field enums.
//!
//! These mirror the slot values stored on agent beads in the issue store.
//! Parsing is lenient: unknown strings map to the `Unknown`/default variant
//! rather than erroring, because the store is shared with other tools.

use serde::{Deserialize, Serialize};

/// Observed work state of an agent, as recorded on its bead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Idle,
    Working,
    Done,
    Stuck,
    #[default]
    Unknown,
}

crate::simple_display! {
    AgentState {
        Idle => "idle",
        Working => "working",
        Done => "done",
        Stuck => "stuck",
        Unknown => "unknown",
    }
}

impl AgentState {
    pub fn parse(s: &str) -> AgentState {
        match s {
            "idle" => AgentState::Idle,
            "working" => AgentState::Working,
            "done" => AgentState::Done,
            "stuck" => AgentState::Stuck,
            _ => AgentState::Unknown,
        }
    }
}

/// Whether an agent accepts direct nudges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    #[default]
    Normal,
    Muted,
}

crate::simple_display! {
    NotificationLevel {
        Normal => "normal",
        Muted => "muted",
    }
}

impl NotificationLevel {
    pub fn parse(s: &str) -> NotificationLevel {
        match s {
            "muted" => NotificationLevel::Muted,
            _ => NotificationLevel::Normal,
        }
    }
}

/// Cleanup state of an ephemeral worker's identity bead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStatus {
    #[default]
    Clean,
    Pending,
    Blocked,
}

crate::simple_display! {
    CleanupStatus {
        Clean => "clean",
        Pending => "pending",
        Blocked => "blocked",
    }
}

impl CleanupStatus {
    pub fn parse(s: &str) -> CleanupStatus {
        match s {
            "pending" => CleanupStatus::Pending,
            "blocked" => CleanupStatus::Blocked,
            _ => CleanupStatus::Clean,
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;

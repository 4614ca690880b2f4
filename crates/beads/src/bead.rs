// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bead record types.
//!
//! A bead is one record in the external issue store. Work beads, agent
//! identity beads, convoys, and mail messages all share the same record
//! shape; agent-specific fields live in the free-form slot map and are
//! exposed through the [`AgentBead`] view.

use chrono::{DateTime, Utc};
use gt_core::{AgentState, CleanupStatus, ConvoyNode, NodeType, NotificationLevel, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Bead lifecycle status.
///
/// Work beads move `open → hooked → closed` with no transitions out of
/// closed; convoys additionally use the staged states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeadStatus {
    #[default]
    Open,
    Hooked,
    Closed,
    StagedReady,
    StagedWarnings,
}

gt_core::simple_display! {
    BeadStatus {
        Open => "open",
        Hooked => "hooked",
        Closed => "closed",
        StagedReady => "staged_ready",
        StagedWarnings => "staged_warnings",
    }
}

/// A dependency reference: either a bead in the same store or an
/// `external:<prefix>:<bead-id>` reference into another rig's store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BeadRef {
    Local(String),
    External { prefix: String, id: String },
}

impl BeadRef {
    pub fn parse(s: &str) -> BeadRef {
        if let Some(rest) = s.strip_prefix("external:") {
            if let Some((prefix, id)) = rest.split_once(':') {
                return BeadRef::External {
                    prefix: prefix.to_string(),
                    id: id.to_string(),
                };
            }
        }
        BeadRef::Local(s.to_string())
    }

    /// The referenced bead id regardless of locality.
    pub fn id(&self) -> &str {
        match self {
            BeadRef::Local(id) => id,
            BeadRef::External { id, .. } => id,
        }
    }
}

impl fmt::Display for BeadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeadRef::Local(id) => write!(f, "{id}"),
            BeadRef::External { prefix, id } => write!(f, "external:{prefix}:{id}"),
        }
    }
}

/// Slot keys used by the core on agent beads.
pub mod slots {
    pub const ROLE_TYPE: &str = "role_type";
    pub const RIG: &str = "rig";
    pub const AGENT_STATE: &str = "agent_state";
    pub const HOOK_BEAD: &str = "hook_bead";
    pub const NOTIFICATION_LEVEL: &str = "notification_level";
    pub const PERSONA_BEAD: &str = "persona_bead";
    pub const CLEANUP_STATUS: &str = "cleanup_status";
    // Mail message slots
    pub const MAIL_FROM: &str = "from";
    pub const MAIL_TO: &str = "to";
    pub const MAIL_TYPE: &str = "type";
}

/// One issue-store record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bead {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub bead_type: NodeType,
    #[serde(default)]
    pub status: BeadStatus,
    /// 0 is most urgent; the dispatcher orders highest priority first.
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Dependency list (convoys track their work beads here).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub slots: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_priority() -> u8 {
    2
}

impl Bead {
    pub fn slot(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// View this bead as an agent identity bead.
    pub fn as_agent(&self) -> AgentBead<'_> {
        AgentBead { bead: self }
    }

    /// Planning view for the convoy wave computation.
    pub fn to_convoy_node(&self) -> ConvoyNode {
        ConvoyNode {
            id: self.id.clone(),
            title: self.title.clone(),
            node_type: self.bead_type,
            rig: self.slot(slots::RIG).unwrap_or_default().to_string(),
            blocks: self.blocks.clone(),
            blocked_by: self.blocked_by.clone(),
            parent: self.parent.clone(),
            children: Vec::new(),
        }
    }
}

gt_core::builder! {
    pub struct BeadBuilder => Bead {
        into {
            id: String = "gt-abc",
            title: String = "a task",
        }
        set {
            bead_type: NodeType = NodeType::Task,
            status: BeadStatus = BeadStatus::Open,
            priority: u8 = 2,
            labels: Vec<String> = Vec::new(),
            blocked_by: Vec<String> = Vec::new(),
            blocks: Vec<String> = Vec::new(),
            deps: Vec<String> = Vec::new(),
            description: String = String::new(),
            slots: std::collections::BTreeMap<String, String> = std::collections::BTreeMap::new(),
            created_at: Option<chrono::DateTime<chrono::Utc>> = None,
            updated_at: Option<chrono::DateTime<chrono::Utc>> = None,
        }
        option {
            assignee: String = None,
            parent: String = None,
        }
    }
}

/// Typed slot accessors over an agent identity bead.
#[derive(Debug, Clone, Copy)]
pub struct AgentBead<'a> {
    bead: &'a Bead,
}

impl AgentBead<'_> {
    pub fn id(&self) -> &str {
        &self.bead.id
    }

    pub fn role(&self) -> Option<Role> {
        Role::parse(self.bead.slot(slots::ROLE_TYPE)?)
    }

    pub fn rig(&self) -> Option<&str> {
        self.bead.slot(slots::RIG)
    }

    pub fn state(&self) -> AgentState {
        AgentState::parse(self.bead.slot(slots::AGENT_STATE).unwrap_or_default())
    }

    /// The work bead on this agent's hook, if any.
    pub fn hook_bead(&self) -> Option<&str> {
        self.bead.slot(slots::HOOK_BEAD)
    }

    pub fn notification_level(&self) -> NotificationLevel {
        NotificationLevel::parse(self.bead.slot(slots::NOTIFICATION_LEVEL).unwrap_or_default())
    }

    pub fn persona_bead(&self) -> Option<&str> {
        self.bead.slot(slots::PERSONA_BEAD)
    }

    pub fn cleanup_status(&self) -> CleanupStatus {
        CleanupStatus::parse(self.bead.slot(slots::CLEANUP_STATUS).unwrap_or_default())
    }
}

/// Which store a new bead lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreScope {
    Town,
    Rig(String),
}

/// Request shape for [`crate::BeadsGateway::create`].
#[derive(Debug, Clone)]
pub struct CreateBead {
    pub scope: StoreScope,
    pub bead_type: NodeType,
    pub title: String,
    pub description: String,
    pub priority: u8,
    pub labels: Vec<String>,
    pub slots: BTreeMap<String, String>,
}

impl CreateBead {
    pub fn new(scope: StoreScope, bead_type: NodeType, title: impl Into<String>) -> CreateBead {
        CreateBead {
            scope,
            bead_type,
            title: title.into(),
            description: String::new(),
            priority: 2,
            labels: Vec::new(),
            slots: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
#[path = "bead_tests.rs"]
mod tests;

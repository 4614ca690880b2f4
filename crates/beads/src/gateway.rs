// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The gateway trait every store implementation satisfies.

use async_trait::async_trait;
use gt_core::NodeType;
use std::collections::BTreeMap;

use crate::bead::{Bead, BeadRef, BeadStatus, CreateBead};
use crate::error::BeadsError;

/// Typed operations on the external issue store.
///
/// `set_hook` / `clear_hook` are atomic relative to other gateway writes on
/// the same agent bead: each maps to a single store mutation. Higher-level
/// transactionality (hook + work-bead status) is the dispatcher's job.
#[async_trait]
pub trait BeadsGateway: Send + Sync {
    async fn show(&self, id: &str) -> Result<Bead, BeadsError>;

    async fn list_by_type_status(
        &self,
        bead_type: NodeType,
        status: BeadStatus,
    ) -> Result<Vec<Bead>, BeadsError>;

    async fn get_slot(&self, id: &str, slot: &str) -> Result<Option<String>, BeadsError>;

    async fn set_slot(&self, id: &str, slot: &str, value: &str) -> Result<(), BeadsError>;

    async fn set_hook(&self, agent_bead: &str, work_bead: &str) -> Result<(), BeadsError>;

    async fn clear_hook(&self, agent_bead: &str) -> Result<(), BeadsError>;

    /// Dependency list; entries may be `external:<prefix>:<id>` references.
    async fn list_deps(&self, id: &str) -> Result<Vec<BeadRef>, BeadsError>;

    /// Create an agent identity bead, or reopen a closed one in place.
    async fn create_or_reopen_agent_bead(
        &self,
        id: &str,
        title: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), BeadsError>;

    async fn create(&self, req: CreateBead) -> Result<Bead, BeadsError>;

    async fn update_status(&self, id: &str, status: BeadStatus) -> Result<(), BeadsError>;

    async fn update_assignee(&self, id: &str, assignee: &str) -> Result<(), BeadsError>;

    /// All hooked beads assigned to `assignee`, aggregated across every
    /// reachable store under the town root.
    async fn list_assigned(&self, assignee: &str) -> Result<Vec<Bead>, BeadsError>;

    /// Mail messages addressed to `to`; unread means still open.
    async fn list_mail(&self, to: &str, unread_only: bool) -> Result<Vec<Bead>, BeadsError>;

    async fn mark_read(&self, id: &str) -> Result<(), BeadsError>;

    async fn close(&self, id: &str) -> Result<(), BeadsError>;
}

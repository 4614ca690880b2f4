// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory gateway for tests.
//!
//! Behaves like a single merged store: ids are global, `list_assigned`
//! sees everything. Failure injection (`fail_next`) makes one named
//! operation return `Unavailable`, which is how the dispatcher's rollback
//! paths are exercised.

use async_trait::async_trait;
use chrono::TimeZone;
use gt_core::NodeType;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::bead::{slots, Bead, BeadRef, BeadStatus, CreateBead, StoreScope};
use crate::error::BeadsError;
use crate::gateway::BeadsGateway;

#[derive(Default)]
struct FakeState {
    beads: BTreeMap<String, Bead>,
    fail_next: Option<String>,
    next_id: u64,
    tick: u64,
}

/// Shared-handle fake store.
#[derive(Clone, Default)]
pub struct FakeBeads {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBeads {
    pub fn new() -> FakeBeads {
        FakeBeads::default()
    }

    /// Seed a bead.
    pub fn insert(&self, bead: Bead) {
        self.state.lock().beads.insert(bead.id.clone(), bead);
    }

    /// Snapshot a bead for assertions.
    pub fn get(&self, id: &str) -> Option<Bead> {
        self.state.lock().beads.get(id).cloned()
    }

    /// Make the next call to the named operation fail with `Unavailable`.
    pub fn fail_next(&self, op: &str) {
        self.state.lock().fail_next = Some(op.to_string());
    }

    fn check_fail(&self, op: &str) -> Result<(), BeadsError> {
        let mut state = self.state.lock();
        if state.fail_next.as_deref() == Some(op) {
            state.fail_next = None;
            return Err(BeadsError::Unavailable(format!("injected failure in {op}")));
        }
        Ok(())
    }

    fn touch(state: &mut FakeState, id: &str) {
        state.tick += 1;
        let stamp = chrono::Utc.timestamp_millis_opt(state.tick as i64).single();
        if let Some(bead) = state.beads.get_mut(id) {
            bead.updated_at = stamp;
        }
    }
}

#[async_trait]
impl BeadsGateway for FakeBeads {
    async fn show(&self, id: &str) -> Result<Bead, BeadsError> {
        self.check_fail("show")?;
        self.get(id).ok_or_else(|| BeadsError::NotFound(id.to_string()))
    }

    async fn list_by_type_status(
        &self,
        bead_type: NodeType,
        status: BeadStatus,
    ) -> Result<Vec<Bead>, BeadsError> {
        self.check_fail("list_by_type_status")?;
        Ok(self
            .state
            .lock()
            .beads
            .values()
            .filter(|b| b.bead_type == bead_type && b.status == status)
            .cloned()
            .collect())
    }

    async fn get_slot(&self, id: &str, slot: &str) -> Result<Option<String>, BeadsError> {
        self.check_fail("get_slot")?;
        let state = self.state.lock();
        let bead = state.beads.get(id).ok_or_else(|| BeadsError::NotFound(id.to_string()))?;
        Ok(bead.slot(slot).map(str::to_string))
    }

    async fn set_slot(&self, id: &str, slot: &str, value: &str) -> Result<(), BeadsError> {
        self.check_fail("set_slot")?;
        let mut state = self.state.lock();
        let bead = state
            .beads
            .get_mut(id)
            .ok_or_else(|| BeadsError::NotFound(id.to_string()))?;
        bead.slots.insert(slot.to_string(), value.to_string());
        Self::touch(&mut state, id);
        Ok(())
    }

    async fn set_hook(&self, agent_bead: &str, work_bead: &str) -> Result<(), BeadsError> {
        self.check_fail("set_hook")?;
        self.set_slot(agent_bead, slots::HOOK_BEAD, work_bead).await
    }

    async fn clear_hook(&self, agent_bead: &str) -> Result<(), BeadsError> {
        self.check_fail("clear_hook")?;
        self.set_slot(agent_bead, slots::HOOK_BEAD, "").await
    }

    async fn list_deps(&self, id: &str) -> Result<Vec<BeadRef>, BeadsError> {
        self.check_fail("list_deps")?;
        let state = self.state.lock();
        let bead = state.beads.get(id).ok_or_else(|| BeadsError::NotFound(id.to_string()))?;
        Ok(bead.deps.iter().map(|s| BeadRef::parse(s)).collect())
    }

    async fn create_or_reopen_agent_bead(
        &self,
        id: &str,
        title: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), BeadsError> {
        self.check_fail("create_or_reopen_agent_bead")?;
        {
            let mut state = self.state.lock();
            match state.beads.get_mut(id) {
                Some(bead) => {
                    if bead.status == BeadStatus::Closed {
                        bead.status = BeadStatus::Open;
                    }
                }
                None => {
                    let mut bead = Bead::builder()
                        .id(id)
                        .title(title)
                        .bead_type(NodeType::Agent)
                        .build();
                    bead.slots.extend(
                        fields.iter().map(|(k, v)| (k.clone(), v.clone())),
                    );
                    state.beads.insert(id.to_string(), bead);
                    return Ok(());
                }
            }
        }
        for (key, value) in fields {
            self.set_slot(id, key, value).await?;
        }
        Ok(())
    }

    async fn create(&self, req: CreateBead) -> Result<Bead, BeadsError> {
        self.check_fail("create")?;
        let mut state = self.state.lock();
        state.next_id += 1;
        let prefix = match &req.scope {
            StoreScope::Town if req.bead_type == NodeType::Message => "gt-mail".to_string(),
            StoreScope::Town => "gt".to_string(),
            StoreScope::Rig(rig) => rig.chars().take(2).collect(),
        };
        let id = format!("{}-{}", prefix, state.next_id);
        let mut bead = Bead::builder()
            .id(id.clone())
            .title(req.title)
            .bead_type(req.bead_type)
            .priority(req.priority)
            .labels(req.labels)
            .description(req.description)
            .build();
        bead.slots = req.slots;
        state.tick += 1;
        bead.created_at = chrono::Utc.timestamp_millis_opt(state.tick as i64).single();
        state.beads.insert(id, bead.clone());
        Ok(bead)
    }

    async fn update_status(&self, id: &str, status: BeadStatus) -> Result<(), BeadsError> {
        self.check_fail("update_status")?;
        let mut state = self.state.lock();
        let bead = state
            .beads
            .get_mut(id)
            .ok_or_else(|| BeadsError::NotFound(id.to_string()))?;
        bead.status = status;
        Self::touch(&mut state, id);
        Ok(())
    }

    async fn update_assignee(&self, id: &str, assignee: &str) -> Result<(), BeadsError> {
        self.check_fail("update_assignee")?;
        let mut state = self.state.lock();
        let bead = state
            .beads
            .get_mut(id)
            .ok_or_else(|| BeadsError::NotFound(id.to_string()))?;
        bead.assignee = Some(assignee.to_string());
        Self::touch(&mut state, id);
        Ok(())
    }

    async fn list_assigned(&self, assignee: &str) -> Result<Vec<Bead>, BeadsError> {
        self.check_fail("list_assigned")?;
        Ok(self
            .state
            .lock()
            .beads
            .values()
            .filter(|b| b.assignee.as_deref() == Some(assignee) && b.status == BeadStatus::Hooked)
            .cloned()
            .collect())
    }

    async fn list_mail(&self, to: &str, unread_only: bool) -> Result<Vec<Bead>, BeadsError> {
        self.check_fail("list_mail")?;
        let to_label = format!("to:{to}");
        Ok(self
            .state
            .lock()
            .beads
            .values()
            .filter(|b| {
                b.bead_type == NodeType::Message
                    && b.labels.contains(&to_label)
                    && (!unread_only || b.status == BeadStatus::Open)
            })
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: &str) -> Result<(), BeadsError> {
        self.check_fail("mark_read")?;
        self.update_status(id, BeadStatus::Closed).await
    }

    async fn close(&self, id: &str) -> Result<(), BeadsError> {
        self.check_fail("close")?;
        self.update_status(id, BeadStatus::Closed).await
    }
}

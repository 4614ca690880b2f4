// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory terminal backend for tests.
//!
//! Records every call so dispatcher tests can assert on delivery order,
//! respawn commands, and environment changes. Nudges skip the 500 ms gap;
//! the contract belongs to real transports, and tests assert on the
//! recorded events instead.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::BackendError;
use crate::terminal::TerminalBackend;

/// One fake session's state and call record.
#[derive(Debug, Clone, Default)]
pub struct FakeSession {
    pub env: BTreeMap<String, String>,
    pub pane: String,
    pub agent_alive: bool,
    pub idle: bool,
    /// Messages delivered via nudge, in order.
    pub sent: Vec<String>,
    /// Commands the pane was respawned with, in order.
    pub respawns: Vec<String>,
    pub history_cleared: u32,
    pub remain_on_exit: Option<bool>,
    pub workdir: Option<PathBuf>,
    pub command: Option<String>,
}

#[derive(Default)]
struct FakeState {
    sessions: BTreeMap<String, FakeSession>,
    killed: Vec<String>,
    fail_next: Option<String>,
}

/// Shared-handle fake backend.
#[derive(Clone, Default)]
pub struct FakeTerminal {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTerminal {
    pub fn new() -> FakeTerminal {
        FakeTerminal::default()
    }

    /// Add a live, idle session with an agent running.
    pub fn add_session(&self, name: &str) {
        self.state.lock().sessions.insert(
            name.to_string(),
            FakeSession { agent_alive: true, idle: true, ..FakeSession::default() },
        );
    }

    /// Mutate a session's state before the scenario runs.
    pub fn with_session(&self, name: &str, f: impl FnOnce(&mut FakeSession)) {
        let mut state = self.state.lock();
        let session = state.sessions.entry(name.to_string()).or_default();
        f(session);
    }

    /// Snapshot a session for assertions.
    pub fn session(&self, name: &str) -> Option<FakeSession> {
        self.state.lock().sessions.get(name).cloned()
    }

    pub fn killed(&self) -> Vec<String> {
        self.state.lock().killed.clone()
    }

    /// Make the next call to the named operation fail with `Unavailable`.
    pub fn fail_next(&self, op: &str) {
        self.state.lock().fail_next = Some(op.to_string());
    }

    fn check_fail(&self, op: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        if state.fail_next.as_deref() == Some(op) {
            state.fail_next = None;
            return Err(BackendError::Unavailable(format!("injected failure in {op}")));
        }
        Ok(())
    }

    fn with_existing<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut FakeSession) -> T,
    ) -> Result<T, BackendError> {
        let mut state = self.state.lock();
        match state.sessions.get_mut(name) {
            Some(session) => Ok(f(session)),
            None => Err(BackendError::SessionNotFound(name.to_string())),
        }
    }
}

#[async_trait]
impl TerminalBackend for FakeTerminal {
    async fn has_session(&self, name: &str) -> Result<bool, BackendError> {
        self.check_fail("has_session")?;
        Ok(self.state.lock().sessions.contains_key(name))
    }

    async fn list_sessions(&self) -> Result<Vec<String>, BackendError> {
        self.check_fail("list_sessions")?;
        Ok(self.state.lock().sessions.keys().cloned().collect())
    }

    async fn new_session(
        &self,
        name: &str,
        workdir: &Path,
        command: &str,
    ) -> Result<(), BackendError> {
        self.check_fail("new_session")?;
        self.state.lock().sessions.insert(
            name.to_string(),
            FakeSession {
                agent_alive: true,
                idle: true,
                workdir: Some(workdir.to_path_buf()),
                command: Some(command.to_string()),
                ..FakeSession::default()
            },
        );
        Ok(())
    }

    async fn kill_session(&self, name: &str) -> Result<(), BackendError> {
        self.check_fail("kill_session")?;
        let mut state = self.state.lock();
        if state.sessions.remove(name).is_none() {
            return Err(BackendError::SessionNotFound(name.to_string()));
        }
        state.killed.push(name.to_string());
        Ok(())
    }

    async fn nudge_session(&self, name: &str, message: &str) -> Result<(), BackendError> {
        self.check_fail("nudge_session")?;
        self.with_existing(name, |s| s.sent.push(message.to_string()))
    }

    async fn capture_pane(&self, name: &str, _lines: u32) -> Result<String, BackendError> {
        self.check_fail("capture_pane")?;
        self.with_existing(name, |s| s.pane.clone())
    }

    async fn get_env(&self, name: &str, key: &str) -> Result<Option<String>, BackendError> {
        self.check_fail("get_env")?;
        self.with_existing(name, |s| s.env.get(key).cloned())
    }

    async fn set_env(&self, name: &str, key: &str, value: &str) -> Result<(), BackendError> {
        self.check_fail("set_env")?;
        self.with_existing(name, |s| {
            s.env.insert(key.to_string(), value.to_string());
        })
    }

    async fn respawn_pane(&self, name: &str, command: &str) -> Result<(), BackendError> {
        self.check_fail("respawn_pane")?;
        self.with_existing(name, |s| {
            s.respawns.push(command.to_string());
            s.agent_alive = true;
        })
    }

    async fn clear_history(&self, name: &str) -> Result<(), BackendError> {
        self.check_fail("clear_history")?;
        self.with_existing(name, |s| s.history_cleared += 1)
    }

    async fn set_remain_on_exit(&self, name: &str, on: bool) -> Result<(), BackendError> {
        self.check_fail("set_remain_on_exit")?;
        self.with_existing(name, |s| s.remain_on_exit = Some(on))
    }

    async fn is_agent_alive(&self, name: &str) -> Result<bool, BackendError> {
        self.check_fail("is_agent_alive")?;
        self.with_existing(name, |s| s.agent_alive)
    }

    async fn is_idle(&self, name: &str) -> Result<bool, BackendError> {
        self.check_fail("is_idle")?;
        self.with_existing(name, |s| s.agent_alive && s.idle)
    }
}

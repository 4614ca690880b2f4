// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-name routing between local and remote backends.
//!
//! Routing is by session-name prefix and the table is fixed at
//! construction, so resolution is stable for the lifetime of a dispatcher
//! operation. With no remote configured everything goes local.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::error::BackendError;
use crate::terminal::TerminalBackend;

/// Composite backend delegating per session name.
#[derive(Clone)]
pub struct RoutedBackend<L, R> {
    local: L,
    remote: Option<R>,
    remote_prefixes: Vec<String>,
}

impl<L: TerminalBackend, R: TerminalBackend> RoutedBackend<L, R> {
    pub fn local_only(local: L) -> RoutedBackend<L, R> {
        RoutedBackend { local, remote: None, remote_prefixes: Vec::new() }
    }

    /// Route sessions whose name starts with any of `prefixes` to `remote`.
    pub fn with_remote(mut self, remote: R, prefixes: Vec<String>) -> RoutedBackend<L, R> {
        self.remote = Some(remote);
        self.remote_prefixes = prefixes;
        self
    }

    fn backend_for(&self, name: &str) -> Result<&dyn TerminalBackend, BackendError> {
        if self.remote_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            return match &self.remote {
                Some(remote) => Ok(remote),
                None => Err(BackendError::Unavailable(format!(
                    "session {name} routes to a remote backend but none is configured"
                ))),
            };
        }
        Ok(&self.local)
    }
}

#[async_trait]
impl<L: TerminalBackend, R: TerminalBackend> TerminalBackend for RoutedBackend<L, R> {
    async fn has_session(&self, name: &str) -> Result<bool, BackendError> {
        self.backend_for(name)?.has_session(name).await
    }

    async fn list_sessions(&self) -> Result<Vec<String>, BackendError> {
        let mut names = self.local.list_sessions().await?;
        if let Some(remote) = &self.remote {
            names.extend(remote.list_sessions().await?);
        }
        Ok(names)
    }

    async fn new_session(
        &self,
        name: &str,
        workdir: &Path,
        command: &str,
    ) -> Result<(), BackendError> {
        self.backend_for(name)?.new_session(name, workdir, command).await
    }

    async fn kill_session(&self, name: &str) -> Result<(), BackendError> {
        self.backend_for(name)?.kill_session(name).await
    }

    async fn nudge_session(&self, name: &str, message: &str) -> Result<(), BackendError> {
        self.backend_for(name)?.nudge_session(name, message).await
    }

    async fn capture_pane(&self, name: &str, lines: u32) -> Result<String, BackendError> {
        self.backend_for(name)?.capture_pane(name, lines).await
    }

    async fn get_env(&self, name: &str, key: &str) -> Result<Option<String>, BackendError> {
        self.backend_for(name)?.get_env(name, key).await
    }

    async fn set_env(&self, name: &str, key: &str, value: &str) -> Result<(), BackendError> {
        self.backend_for(name)?.set_env(name, key, value).await
    }

    async fn respawn_pane(&self, name: &str, command: &str) -> Result<(), BackendError> {
        self.backend_for(name)?.respawn_pane(name, command).await
    }

    async fn clear_history(&self, name: &str) -> Result<(), BackendError> {
        self.backend_for(name)?.clear_history(name).await
    }

    async fn set_remain_on_exit(&self, name: &str, on: bool) -> Result<(), BackendError> {
        self.backend_for(name)?.set_remain_on_exit(name, on).await
    }

    async fn is_agent_alive(&self, name: &str) -> Result<bool, BackendError> {
        self.backend_for(name)?.is_agent_alive(name).await
    }

    async fn wait_for_agent_ready(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<bool, BackendError> {
        self.backend_for(name)?.wait_for_agent_ready(name, timeout).await
    }

    async fn is_idle(&self, name: &str) -> Result<bool, BackendError> {
        self.backend_for(name)?.is_idle(name).await
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;

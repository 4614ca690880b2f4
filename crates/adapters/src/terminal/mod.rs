// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The terminal backend contract.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::error::BackendError;

pub mod fake;
pub mod pod;
pub mod tmux;

/// Gap between the literal paste and the Enter keypress in
/// [`TerminalBackend::nudge_session`].
///
/// The agent UI treats a combined paste+enter as an incomplete submission,
/// so delivery is two separate events with this wait between them. The gap
/// is part of the contract: every real backend must honor it.
pub const NUDGE_PASTE_DELAY: Duration = Duration::from_millis(500);

/// Marker the agent UI shows while a tool call or generation is running.
/// A pane without it is considered idle.
pub const BUSY_MARKER: &str = "esc to interrupt";

/// Shell process names that mean "no agent running in this pane".
const SHELL_COMMANDS: &[&str] = &["bash", "zsh", "sh", "fish", "dash"];

/// Returns true when a pane's foreground command is an agent, not a shell.
pub(crate) fn command_is_agent(command: &str) -> bool {
    let command = command.trim();
    !command.is_empty() && !SHELL_COMMANDS.contains(&command)
}

/// Create, kill, observe, and type into agent sessions.
///
/// Implementations may talk to a local terminal multiplexer or a remote
/// pod; callers must not assume which. All operations may block
/// indefinitely on the underlying transport; cancellation is carried by
/// the token given at construction.
#[async_trait]
pub trait TerminalBackend: Send + Sync {
    async fn has_session(&self, name: &str) -> Result<bool, BackendError>;

    async fn list_sessions(&self) -> Result<Vec<String>, BackendError>;

    async fn new_session(
        &self,
        name: &str,
        workdir: &Path,
        command: &str,
    ) -> Result<(), BackendError>;

    async fn kill_session(&self, name: &str) -> Result<(), BackendError>;

    /// Deliver `message` to the session's agent: literal paste, wait
    /// [`NUDGE_PASTE_DELAY`], then Enter as a separate event.
    async fn nudge_session(&self, name: &str, message: &str) -> Result<(), BackendError>;

    /// Recent pane contents (last `lines` lines).
    async fn capture_pane(&self, name: &str, lines: u32) -> Result<String, BackendError>;

    async fn get_env(&self, name: &str, key: &str) -> Result<Option<String>, BackendError>;

    async fn set_env(&self, name: &str, key: &str, value: &str) -> Result<(), BackendError>;

    /// Kill whatever runs in the session's pane and start `command` in its
    /// place, keeping the session itself alive.
    async fn respawn_pane(&self, name: &str, command: &str) -> Result<(), BackendError>;

    async fn clear_history(&self, name: &str) -> Result<(), BackendError>;

    async fn set_remain_on_exit(&self, name: &str, on: bool) -> Result<(), BackendError>;

    /// Whether an agent process (not a bare shell) runs in the pane.
    async fn is_agent_alive(&self, name: &str) -> Result<bool, BackendError>;

    /// Poll [`Self::is_agent_alive`] until it turns true or `timeout`
    /// elapses. Returns whether the agent became ready.
    async fn wait_for_agent_ready(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<bool, BackendError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.is_agent_alive(name).await? {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    /// Whether the agent is waiting for input (alive and not mid-tool).
    async fn is_idle(&self, name: &str) -> Result<bool, BackendError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

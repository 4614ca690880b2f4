// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local tmux backend.

use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::error::BackendError;
use crate::terminal::{command_is_agent, TerminalBackend, BUSY_MARKER, NUDGE_PASTE_DELAY};

/// Backend driving a local tmux server.
#[derive(Debug, Clone)]
pub struct TmuxBackend {
    tmux_bin: String,
    cancel: CancellationToken,
}

impl Default for TmuxBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TmuxBackend {
    pub fn new() -> TmuxBackend {
        TmuxBackend {
            tmux_bin: "tmux".to_string(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> TmuxBackend {
        self.cancel = cancel;
        self
    }

    #[cfg(test)]
    fn with_tmux_bin(mut self, bin: &str) -> TmuxBackend {
        self.tmux_bin = bin.to_string();
        self
    }

    /// Run tmux and return stdout. Session-targeting failures map to
    /// `SessionNotFound`; everything else is `Unavailable`.
    async fn run(&self, target: Option<&str>, args: &[&str]) -> Result<String, BackendError> {
        if self.cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        let mut cmd = tokio::process::Command::new(&self.tmux_bin);
        cmd.args(args);

        let output = tokio::select! {
            out = cmd.output() => {
                out.map_err(|e| BackendError::Unavailable(format!("failed to run tmux: {e}")))?
            }
            _ = self.cancel.cancelled() => return Err(BackendError::Cancelled),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(?args, stderr = %stderr.trim(), "tmux command failed");
            if let Some(session) = target {
                if stderr.contains("can't find session")
                    || stderr.contains("no such session")
                    || stderr.contains("session not found")
                {
                    return Err(BackendError::SessionNotFound(session.to_string()));
                }
            }
            return Err(BackendError::Unavailable(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl TerminalBackend for TmuxBackend {
    async fn has_session(&self, name: &str) -> Result<bool, BackendError> {
        match self.run(Some(name), &["has-session", "-t", name]).await {
            Ok(_) => Ok(true),
            Err(BackendError::SessionNotFound(_)) => Ok(false),
            // tmux exits 1 with varying text when the server is down
            Err(BackendError::Unavailable(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_sessions(&self) -> Result<Vec<String>, BackendError> {
        match self.run(None, &["list-sessions", "-F", "#{session_name}"]).await {
            Ok(out) => Ok(out.lines().map(str::to_string).collect()),
            // No server running means no sessions
            Err(BackendError::Unavailable(msg)) if msg.contains("no server") => Ok(vec![]),
            Err(e) => Err(e),
        }
    }

    async fn new_session(
        &self,
        name: &str,
        workdir: &Path,
        command: &str,
    ) -> Result<(), BackendError> {
        let workdir = workdir.to_string_lossy();
        self.run(
            Some(name),
            &["new-session", "-d", "-s", name, "-c", &workdir, command],
        )
        .await?;
        Ok(())
    }

    async fn kill_session(&self, name: &str) -> Result<(), BackendError> {
        self.run(Some(name), &["kill-session", "-t", name]).await?;
        Ok(())
    }

    async fn nudge_session(&self, name: &str, message: &str) -> Result<(), BackendError> {
        // Literal paste: -l disables key-name interpretation.
        self.run(Some(name), &["send-keys", "-t", name, "-l", message]).await?;
        tokio::time::sleep(NUDGE_PASTE_DELAY).await;
        self.run(Some(name), &["send-keys", "-t", name, "Enter"]).await?;
        Ok(())
    }

    async fn capture_pane(&self, name: &str, lines: u32) -> Result<String, BackendError> {
        let start = format!("-{lines}");
        self.run(Some(name), &["capture-pane", "-t", name, "-p", "-S", &start]).await
    }

    async fn get_env(&self, name: &str, key: &str) -> Result<Option<String>, BackendError> {
        match self.run(Some(name), &["show-environment", "-t", name, key]).await {
            Ok(out) => Ok(out
                .trim_end()
                .strip_prefix(&format!("{key}="))
                .map(str::to_string)),
            // Unset variables exit 1 with "unknown variable"
            Err(BackendError::Unavailable(msg)) if msg.contains("unknown variable") => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set_env(&self, name: &str, key: &str, value: &str) -> Result<(), BackendError> {
        self.run(Some(name), &["set-environment", "-t", name, key, value]).await?;
        Ok(())
    }

    async fn respawn_pane(&self, name: &str, command: &str) -> Result<(), BackendError> {
        // -k kills whatever is still running in the pane first.
        self.run(Some(name), &["respawn-pane", "-k", "-t", name, command]).await?;
        Ok(())
    }

    async fn clear_history(&self, name: &str) -> Result<(), BackendError> {
        self.run(Some(name), &["clear-history", "-t", name]).await?;
        Ok(())
    }

    async fn set_remain_on_exit(&self, name: &str, on: bool) -> Result<(), BackendError> {
        let value = if on { "on" } else { "off" };
        self.run(
            Some(name),
            &["set-option", "-t", name, "remain-on-exit", value],
        )
        .await?;
        Ok(())
    }

    async fn is_agent_alive(&self, name: &str) -> Result<bool, BackendError> {
        let out = self
            .run(
                Some(name),
                &["list-panes", "-t", name, "-F", "#{pane_current_command}"],
            )
            .await?;
        Ok(out.lines().any(command_is_agent))
    }

    async fn is_idle(&self, name: &str) -> Result<bool, BackendError> {
        if !self.is_agent_alive(name).await? {
            return Ok(false);
        }
        let pane = self.capture_pane(name, 30).await?;
        Ok(!pane.contains(BUSY_MARKER))
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote pod backend.
//!
//! Agents hosted in Kubernetes run tmux inside their pod with the fixed
//! session key `claude`; the backend's session *name* selects the pod and
//! every tmux invocation is exec'd inside it. Pod provisioning is the
//! installer's job; this backend only drives sessions that already exist.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams, ListParams};
use kube::Client;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use crate::error::BackendError;
use crate::terminal::{command_is_agent, TerminalBackend, BUSY_MARKER, NUDGE_PASTE_DELAY};

/// Tmux session key inside every agent pod.
const POD_SESSION_KEY: &str = "claude";

/// Label selector identifying Gas Town agent pods.
const AGENT_POD_SELECTOR: &str = "app.kubernetes.io/part-of=gastown";

/// Backend exec'ing tmux commands inside agent pods.
#[derive(Clone)]
pub struct PodBackend {
    client: Client,
    namespace: String,
    cancel: CancellationToken,
}

impl PodBackend {
    pub fn new(client: Client, namespace: impl Into<String>) -> PodBackend {
        PodBackend {
            client,
            namespace: namespace.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Connect using the ambient kubeconfig.
    pub async fn connect(namespace: &str) -> Result<PodBackend, BackendError> {
        let client = Client::try_default()
            .await
            .map_err(|e| BackendError::Unavailable(format!("kube client: {e}")))?;
        Ok(PodBackend::new(client, namespace))
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> PodBackend {
        self.cancel = cancel;
        self
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    /// Exec a command in the pod and collect stdout.
    async fn exec(&self, pod: &str, command: Vec<String>) -> Result<String, BackendError> {
        if self.cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }
        let params = AttachParams::default().stdout(true).stderr(true);
        let pods = self.pods();
        let attach = pods.exec(pod, command, &params);

        let mut attached = tokio::select! {
            res = attach => res.map_err(|e| {
                let msg = e.to_string();
                if msg.contains("not found") {
                    BackendError::SessionNotFound(pod.to_string())
                } else {
                    BackendError::Unavailable(format!("pod exec: {msg}"))
                }
            })?,
            _ = self.cancel.cancelled() => return Err(BackendError::Cancelled),
        };

        let mut stdout = String::new();
        if let Some(mut reader) = attached.stdout() {
            reader
                .read_to_string(&mut stdout)
                .await
                .map_err(BackendError::Io)?;
        }
        let mut stderr = String::new();
        if let Some(mut reader) = attached.stderr() {
            reader
                .read_to_string(&mut stderr)
                .await
                .map_err(BackendError::Io)?;
        }
        attached
            .join()
            .await
            .map_err(|e| BackendError::Unavailable(format!("pod exec join: {e}")))?;

        if stderr.contains("can't find session") || stderr.contains("no such session") {
            return Err(BackendError::SessionNotFound(pod.to_string()));
        }
        if !stderr.is_empty() {
            tracing::debug!(pod, stderr = %stderr.trim(), "pod exec stderr");
        }
        Ok(stdout)
    }

    async fn tmux(&self, pod: &str, args: &[&str]) -> Result<String, BackendError> {
        let mut command = vec!["tmux".to_string()];
        command.extend(args.iter().map(|s| s.to_string()));
        self.exec(pod, command).await
    }
}

#[async_trait]
impl TerminalBackend for PodBackend {
    async fn has_session(&self, name: &str) -> Result<bool, BackendError> {
        match self.pods().get_opt(name).await {
            Ok(pod) => Ok(pod.is_some()),
            Err(e) => Err(BackendError::Unavailable(format!("pod lookup: {e}"))),
        }
    }

    async fn list_sessions(&self) -> Result<Vec<String>, BackendError> {
        let params = ListParams::default().labels(AGENT_POD_SELECTOR);
        let pods = self
            .pods()
            .list(&params)
            .await
            .map_err(|e| BackendError::Unavailable(format!("pod list: {e}")))?;
        Ok(pods
            .items
            .into_iter()
            .filter_map(|p| p.metadata.name)
            .collect())
    }

    async fn new_session(
        &self,
        _name: &str,
        _workdir: &Path,
        _command: &str,
    ) -> Result<(), BackendError> {
        Err(BackendError::Unavailable(
            "pod backend cannot create sessions; pods are provisioned out of band".to_string(),
        ))
    }

    async fn kill_session(&self, name: &str) -> Result<(), BackendError> {
        self.tmux(name, &["kill-session", "-t", POD_SESSION_KEY]).await?;
        Ok(())
    }

    async fn nudge_session(&self, name: &str, message: &str) -> Result<(), BackendError> {
        self.tmux(name, &["send-keys", "-t", POD_SESSION_KEY, "-l", message]).await?;
        tokio::time::sleep(NUDGE_PASTE_DELAY).await;
        self.tmux(name, &["send-keys", "-t", POD_SESSION_KEY, "Enter"]).await?;
        Ok(())
    }

    async fn capture_pane(&self, name: &str, lines: u32) -> Result<String, BackendError> {
        let start = format!("-{lines}");
        self.tmux(
            name,
            &["capture-pane", "-t", POD_SESSION_KEY, "-p", "-S", &start],
        )
        .await
    }

    async fn get_env(&self, name: &str, key: &str) -> Result<Option<String>, BackendError> {
        let out = self
            .tmux(name, &["show-environment", "-t", POD_SESSION_KEY, key])
            .await
            .unwrap_or_default();
        Ok(out
            .trim_end()
            .strip_prefix(&format!("{key}="))
            .map(str::to_string))
    }

    async fn set_env(&self, name: &str, key: &str, value: &str) -> Result<(), BackendError> {
        self.tmux(name, &["set-environment", "-t", POD_SESSION_KEY, key, value]).await?;
        Ok(())
    }

    async fn respawn_pane(&self, name: &str, command: &str) -> Result<(), BackendError> {
        self.tmux(name, &["respawn-pane", "-k", "-t", POD_SESSION_KEY, command]).await?;
        Ok(())
    }

    async fn clear_history(&self, name: &str) -> Result<(), BackendError> {
        self.tmux(name, &["clear-history", "-t", POD_SESSION_KEY]).await?;
        Ok(())
    }

    async fn set_remain_on_exit(&self, name: &str, on: bool) -> Result<(), BackendError> {
        let value = if on { "on" } else { "off" };
        self.tmux(
            name,
            &["set-option", "-t", POD_SESSION_KEY, "remain-on-exit", value],
        )
        .await?;
        Ok(())
    }

    async fn is_agent_alive(&self, name: &str) -> Result<bool, BackendError> {
        let out = self
            .tmux(
                name,
                &["list-panes", "-t", POD_SESSION_KEY, "-F", "#{pane_current_command}"],
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

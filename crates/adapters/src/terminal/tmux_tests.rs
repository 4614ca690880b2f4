// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::os::unix::fs::PermissionsExt;

/// Write an executable stub standing in for the tmux binary.
fn stub_tmux(dir: &std::path::Path, body: &str) -> TmuxBackend {
    let path = dir.join("tmux");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    TmuxBackend::new().with_tmux_bin(&path.to_string_lossy())
}

#[tokio::test]
async fn missing_session_maps_to_session_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let tmux = stub_tmux(dir.path(), r#"echo "can't find session: gt-x" >&2; exit 1"#);
    match tmux.kill_session("gt-x").await {
        Err(BackendError::SessionNotFound(name)) => assert_eq!(name, "gt-x"),
        other => panic!("expected SessionNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn has_session_false_when_server_down() {
    let dir = tempfile::tempdir().unwrap();
    let tmux = stub_tmux(dir.path(), r#"echo "no server running" >&2; exit 1"#);
    assert!(!tmux.has_session("gt-mayor").await.unwrap());
}

#[tokio::test]
async fn list_sessions_parses_lines() {
    let dir = tempfile::tempdir().unwrap();
    let tmux = stub_tmux(dir.path(), "printf 'gt-mayor\\ngt-gastown-alpha\\n'");
    assert_eq!(
        tmux.list_sessions().await.unwrap(),
        vec!["gt-mayor", "gt-gastown-alpha"]
    );
}

#[tokio::test]
async fn list_sessions_empty_without_server() {
    let dir = tempfile::tempdir().unwrap();
    let tmux = stub_tmux(dir.path(), r#"echo "no server running on /tmp/tmux" >&2; exit 1"#);
    assert!(tmux.list_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn get_env_strips_key_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let tmux = stub_tmux(dir.path(), "echo 'GT_QUOTA_ACCOUNT=work'");
    assert_eq!(
        tmux.get_env("gt-mayor", "GT_QUOTA_ACCOUNT").await.unwrap(),
        Some("work".to_string())
    );
}

#[tokio::test]
async fn get_env_unset_variable_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let tmux = stub_tmux(dir.path(), r#"echo "unknown variable: NOPE" >&2; exit 1"#);
    assert_eq!(tmux.get_env("gt-mayor", "NOPE").await.unwrap(), None);
}

#[tokio::test]
async fn is_agent_alive_ignores_shells() {
    let dir = tempfile::tempdir().unwrap();
    let tmux = stub_tmux(dir.path(), "echo 'bash'");
    assert!(!tmux.is_agent_alive("gt-mayor").await.unwrap());

    let tmux = stub_tmux(dir.path(), "echo 'claude'");
    assert!(tmux.is_agent_alive("gt-mayor").await.unwrap());
}

#[tokio::test]
async fn cancelled_token_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();
    let tmux = stub_tmux(dir.path(), "echo ok").with_cancel(cancel);
    assert!(matches!(
        tmux.list_sessions().await,
        Err(BackendError::Cancelled)
    ));
}

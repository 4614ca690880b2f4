// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::terminal::fake::FakeTerminal;

fn routed() -> RoutedBackend<FakeTerminal, FakeTerminal> {
    let local = FakeTerminal::new();
    local.add_session("gt-mayor");
    let remote = FakeTerminal::new();
    remote.add_session("gt-cloud-alpha");
    RoutedBackend::local_only(local).with_remote(remote, vec!["gt-cloud-".to_string()])
}

#[tokio::test]
async fn routes_by_prefix() {
    let backend = routed();
    assert!(backend.has_session("gt-mayor").await.unwrap());
    assert!(backend.has_session("gt-cloud-alpha").await.unwrap());
    // The local backend does not know the remote session.
    backend.nudge_session("gt-cloud-alpha", "hi").await.unwrap();
}

#[tokio::test]
async fn list_merges_both_backends() {
    let backend = routed();
    let mut names = backend.list_sessions().await.unwrap();
    names.sort();
    assert_eq!(names, vec!["gt-cloud-alpha", "gt-mayor"]);
}

#[tokio::test]
async fn remote_prefix_without_remote_is_an_error() {
    let local = FakeTerminal::new();
    let backend: RoutedBackend<FakeTerminal, FakeTerminal> = RoutedBackend {
        local,
        remote: None,
        remote_prefixes: vec!["gt-cloud-".to_string()],
    };
    assert!(matches!(
        backend.has_session("gt-cloud-alpha").await,
        Err(BackendError::Unavailable(_))
    ));
}

#[tokio::test]
async fn local_only_routes_everything_local() {
    let local = FakeTerminal::new();
    local.add_session("gt-anything");
    let backend: RoutedBackend<FakeTerminal, FakeTerminal> = RoutedBackend::local_only(local);
    assert!(backend.has_session("gt-anything").await.unwrap());
}

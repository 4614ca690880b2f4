// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::os::unix::fs::PermissionsExt;

fn routed_cli(root: &Path) -> BdCli {
    let routes = Routes::from_pairs([("gastown", "gt"), ("beads", "bd")]);
    BdCli::new(Town::at(root), routes)
}

#[test]
fn store_routing_follows_prefix() {
    let cli = routed_cli(Path::new("/town"));
    assert_eq!(cli.store_dir("bd-xyz"), PathBuf::from("/town/beads/.beads"));
    assert_eq!(cli.store_dir("gt-abc"), PathBuf::from("/town/gastown/.beads"));
    // Unknown prefixes fall back to the town store.
    assert_eq!(cli.store_dir("zz-123"), PathBuf::from("/town/.beads"));
}

#[test]
fn town_singletons_and_mail_pinned_to_town_store() {
    // "gt" is also a rig prefix here; the pins must win.
    let cli = routed_cli(Path::new("/town"));
    assert_eq!(cli.store_dir("gt-mayor"), PathBuf::from("/town/.beads"));
    assert_eq!(cli.store_dir("gt-deacon"), PathBuf::from("/town/.beads"));
    assert_eq!(cli.store_dir("gt-mail-7"), PathBuf::from("/town/.beads"));
}

#[test]
fn all_store_dirs_cover_town_and_rigs() {
    let cli = routed_cli(Path::new("/town"));
    let dirs = cli.all_store_dirs();
    assert_eq!(dirs.len(), 3);
    assert!(dirs.contains(&PathBuf::from("/town/.beads")));
    assert!(dirs.contains(&PathBuf::from("/town/gastown/.beads")));
    assert!(dirs.contains(&PathBuf::from("/town/beads/.beads")));
}

/// Write an executable stub standing in for the `bd` binary.
fn stub_bd(dir: &Path, body: &str) -> String {
    let path = dir.join("bd");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn show_parses_stub_output() {
    let dir = tempfile::tempdir().unwrap();
    let bin = stub_bd(
        dir.path(),
        r#"echo '{"id":"gt-abc","title":"a task","type":"task","status":"hooked"}'"#,
    );
    let cli = routed_cli(dir.path()).with_bd_bin(&bin);
    let bead = cli.show("gt-abc").await.unwrap();
    assert_eq!(bead.id, "gt-abc");
    assert_eq!(bead.status, BeadStatus::Hooked);
}

#[tokio::test]
async fn missing_bead_maps_to_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let bin = stub_bd(dir.path(), r#"echo 'error: bead not found' >&2; exit 1"#);
    let cli = routed_cli(dir.path()).with_bd_bin(&bin);
    match cli.show("gt-nope").await {
        Err(BeadsError::NotFound(id)) => assert_eq!(id, "gt-nope"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn store_failure_maps_to_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let bin = stub_bd(dir.path(), r#"echo 'store is on fire' >&2; exit 2"#);
    let cli = routed_cli(dir.path()).with_bd_bin(&bin);
    match cli.show("gt-abc").await {
        Err(BeadsError::Unavailable(msg)) => assert!(msg.contains("on fire")),
        other => panic!("expected Unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn cancelled_token_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let bin = stub_bd(dir.path(), "echo '{}'");
    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();
    let cli = routed_cli(dir.path()).with_bd_bin(&bin).with_cancel(cancel);
    assert!(matches!(cli.show("gt-abc").await, Err(BeadsError::Cancelled)));
}

#[tokio::test]
async fn empty_slot_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let bin = stub_bd(dir.path(), "echo ''");
    let cli = routed_cli(dir.path()).with_bd_bin(&bin);
    assert_eq!(cli.get_slot("gt-abc", "hook_bead").await.unwrap(), None);
}

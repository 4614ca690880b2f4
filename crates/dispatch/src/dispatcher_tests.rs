// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testutil::harness;
use gt_core::{AgentAddress, Identity};

#[test]
fn resolve_plain_addresses() {
    let h = harness();
    assert_eq!(
        h.dispatcher.resolve_target("mayor").unwrap(),
        AgentAddress::Mayor
    );
    assert_eq!(
        h.dispatcher.resolve_target("gastown/crew/max").unwrap(),
        AgentAddress::Crew { rig: "gastown".into(), name: "max".into() }
    );
}

#[test]
fn resolve_role_shortcuts_from_identity() {
    let mut h = harness();
    h.dispatcher.ctx.identity = Some(Identity {
        address: AgentAddress::parse("gastown/furiosa").unwrap(),
    });
    assert_eq!(
        h.dispatcher.resolve_target("witness").unwrap(),
        AgentAddress::Witness { rig: "gastown".into() }
    );
    assert_eq!(
        h.dispatcher.resolve_target("refinery").unwrap(),
        AgentAddress::Refinery { rig: "gastown".into() }
    );
}

#[test]
fn resolve_shortcut_without_identity_fails() {
    let h = harness();
    let err = h.dispatcher.resolve_target("refinery").unwrap_err();
    assert_eq!(err.kind(), "unknown_address");
    assert!(err.to_string().contains("GT_RIG"));
}

#[tokio::test]
async fn ensure_agent_bead_creates_with_identity_fields() {
    let h = harness();
    let addr = AgentAddress::parse("gastown/crew/max").unwrap();
    let bead_id = h.dispatcher.ensure_agent_bead(&addr).await.unwrap();
    assert_eq!(bead_id, "gt-gastown-crew-max");

    let bead = h.beads.get(&bead_id).unwrap();
    let agent = bead.as_agent();
    assert_eq!(agent.role(), Some(gt_core::Role::Crew));
    assert_eq!(agent.rig(), Some("gastown"));
}

#[tokio::test]
async fn ensure_agent_bead_reopens_closed_bead() {
    let h = harness();
    let addr = AgentAddress::parse("gastown/furiosa").unwrap();
    let bead_id = h.dispatcher.ensure_agent_bead(&addr).await.unwrap();
    h.beads.close(&bead_id).await.unwrap();

    h.dispatcher.ensure_agent_bead(&addr).await.unwrap();
    assert_eq!(h.beads.get(&bead_id).unwrap().status, gt_beads::BeadStatus::Open);
}

#[test]
fn bead_lock_paths_live_under_the_town() {
    let h = harness();
    let path = h.dispatcher.bead_lock_path("gt-abc");
    assert!(path.starts_with(h.dispatcher.ctx.town.root()));
    assert!(path.to_string_lossy().ends_with("gt-abc.lock"));
}

#[test]
fn unknown_rig_fails_bead_resolution() {
    let h = harness();
    let addr = AgentAddress::parse("wasteland/rictus").unwrap();
    let err = h.dispatcher.agent_bead_id(&addr).unwrap_err();
    assert_eq!(err.kind(), "unknown_address");
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    local = { "gt-abc", BeadRef::Local("gt-abc".into()) },
    external = { "external:bd:bd-xyz", BeadRef::External { prefix: "bd".into(), id: "bd-xyz".into() } },
    external_missing_id = { "external:broken", BeadRef::Local("external:broken".into()) },
)]
fn bead_ref_parse(input: &str, expected: BeadRef) {
    assert_eq!(BeadRef::parse(input), expected);
}

#[test]
fn bead_ref_display_round_trips() {
    for raw in ["gt-abc", "external:bd:bd-xyz"] {
        assert_eq!(BeadRef::parse(raw).to_string(), raw);
    }
}

#[test]
fn bead_ref_id_ignores_locality() {
    assert_eq!(BeadRef::parse("external:bd:bd-xyz").id(), "bd-xyz");
    assert_eq!(BeadRef::parse("gt-abc").id(), "gt-abc");
}

#[test]
fn empty_slots_read_as_absent() {
    let mut bead = Bead::builder().build();
    bead.slots.insert(slots::HOOK_BEAD.into(), String::new());
    assert_eq!(bead.as_agent().hook_bead(), None);

    bead.slots.insert(slots::HOOK_BEAD.into(), "gt-abc".into());
    assert_eq!(bead.as_agent().hook_bead(), Some("gt-abc"));
}

#[test]
fn agent_bead_typed_accessors() {
    let mut bead = Bead::builder().id("gt-gastown-polecat-furiosa").build();
    bead.slots.insert(slots::ROLE_TYPE.into(), "polecat".into());
    bead.slots.insert(slots::RIG.into(), "gastown".into());
    bead.slots.insert(slots::AGENT_STATE.into(), "working".into());
    bead.slots.insert(slots::NOTIFICATION_LEVEL.into(), "muted".into());
    bead.slots.insert(slots::CLEANUP_STATUS.into(), "pending".into());

    let agent = bead.as_agent();
    assert_eq!(agent.role(), Some(gt_core::Role::Polecat));
    assert_eq!(agent.rig(), Some("gastown"));
    assert_eq!(agent.state(), gt_core::AgentState::Working);
    assert_eq!(agent.notification_level(), gt_core::NotificationLevel::Muted);
    assert_eq!(agent.cleanup_status(), gt_core::CleanupStatus::Pending);
    assert_eq!(agent.persona_bead(), None);
}

#[test]
fn unknown_slot_values_fall_back() {
    let mut bead = Bead::builder().build();
    bead.slots.insert(slots::AGENT_STATE.into(), "no-such-state".into());
    assert_eq!(bead.as_agent().state(), gt_core::AgentState::Unknown);
}

#[test]
fn to_convoy_node_carries_edges() {
    let bead = Bead::builder()
        .id("gt-t1")
        .blocks(vec!["gt-t2".into()])
        .blocked_by(vec!["gt-t0".into()])
        .build();
    let node = bead.to_convoy_node();
    assert_eq!(node.id, "gt-t1");
    assert_eq!(node.blocks, vec!["gt-t2"]);
    assert_eq!(node.blocked_by, vec!["gt-t0"]);
    assert!(node.node_type.is_slingable());
}

#[test]
fn bead_deserializes_from_store_json() {
    let raw = r#"{
        "id": "gt-abc",
        "title": "fix the flare stack",
        "type": "task",
        "status": "open",
        "priority": 1,
        "labels": ["refinery"],
        "blocked_by": ["gt-aaa"],
        "slots": {"rig": "gastown"}
    }"#;
    let bead: Bead = serde_json::from_str(raw).unwrap();
    assert_eq!(bead.id, "gt-abc");
    assert_eq!(bead.status, BeadStatus::Open);
    assert_eq!(bead.priority, 1);
    assert_eq!(bead.slot("rig"), Some("gastown"));
    assert_eq!(bead.assignee, None);
}

#[test]
fn status_serializes_snake_case() {
    assert_eq!(serde_json::to_string(&BeadStatus::StagedReady).unwrap(), "\"staged_ready\"");
    assert_eq!(BeadStatus::StagedWarnings.to_string(), "staged_warnings");
}

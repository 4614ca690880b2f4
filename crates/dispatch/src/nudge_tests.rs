// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testutil::harness;
use gt_beads::slots;
use gt_core::{AgentAddress, Identity, NodeType};

fn muted_agent_bead(id: &str) -> gt_beads::Bead {
    let mut bead = gt_beads::Bead::builder().id(id).bead_type(NodeType::Agent).build();
    bead.slots
        .insert(slots::NOTIFICATION_LEVEL.to_string(), "muted".to_string());
    bead
}

#[tokio::test]
async fn direct_nudge_delivers_to_session() {
    let h = harness();
    h.term.add_session("gt-mayor");
    let report = h
        .dispatcher
        .nudge("mayor", "wake up", &NudgeOptions::default())
        .await
        .unwrap();
    assert!(report.all_ok());
    assert_eq!(report.delivered, vec!["mayor"]);
    assert_eq!(h.term.session("gt-mayor").unwrap().sent, vec!["wake up"]);
}

#[tokio::test]
async fn role_shortcut_uses_caller_rig() {
    let mut h = harness();
    h.dispatcher.ctx.identity = Some(Identity {
        address: AgentAddress::parse("gastown/furiosa").unwrap(),
    });
    h.term.add_session("gt-gastown-witness");

    let report = h
        .dispatcher
        .nudge("witness", "status?", &NudgeOptions::default())
        .await
        .unwrap();
    assert_eq!(report.delivered, vec!["gastown/witness"]);
}

#[tokio::test]
async fn role_shortcut_without_rig_context_fails() {
    let h = harness();
    let err = h
        .dispatcher
        .nudge("witness", "status?", &NudgeOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unknown_address");
}

#[tokio::test]
async fn muted_target_is_skipped_unless_forced() {
    let h = harness();
    h.term.add_session("gt-gastown-witness");
    h.beads.insert(muted_agent_bead("gt-gastown-witness"));

    let report = h
        .dispatcher
        .nudge("gastown/witness", "hello", &NudgeOptions::default())
        .await
        .unwrap();
    assert!(report.all_ok());
    assert_eq!(report.muted, vec!["gastown/witness"]);
    assert!(h.term.session("gt-gastown-witness").unwrap().sent.is_empty());

    let report = h
        .dispatcher
        .nudge(
            "gastown/witness",
            "hello",
            &NudgeOptions { force: true, ..NudgeOptions::default() },
        )
        .await
        .unwrap();
    assert_eq!(report.delivered, vec!["gastown/witness"]);
    assert_eq!(h.term.session("gt-gastown-witness").unwrap().sent, vec!["hello"]);
}

#[tokio::test]
async fn channel_fanout_matches_live_sessions() {
    let h = harness();
    // workers = gastown polecats + gastown witness
    let mut channels = Channels::default();
    channels.insert(
        "workers",
        vec!["gastown/polecats/*".to_string(), "gastown/witness".to_string()],
    );
    channels.save(&h.dispatcher.ctx.town.channels_json()).unwrap();

    for session in [
        "gt-gastown-alpha",
        "gt-gastown-beta",
        "gt-gastown-witness",
        "gt-beads-gamma",
    ] {
        h.term.add_session(session);
    }

    let report = h
        .dispatcher
        .nudge("channel:workers", "hi", &NudgeOptions::default())
        .await
        .unwrap();
    assert!(report.all_ok());
    assert_eq!(report.delivered.len(), 3);
    assert!(report.delivered.contains(&"gastown/alpha".to_string()));
    assert!(report.delivered.contains(&"gastown/beta".to_string()));
    assert!(report.delivered.contains(&"gastown/witness".to_string()));
    // The other rig's polecat is excluded.
    assert!(h.term.session("gt-beads-gamma").unwrap().sent.is_empty());
}

#[tokio::test]
async fn channel_failures_are_collected_per_target() {
    let h = harness();
    let mut channels = Channels::default();
    channels.insert("pair", vec!["gastown/polecats/*".to_string()]);
    channels.save(&h.dispatcher.ctx.town.channels_json()).unwrap();

    h.term.add_session("gt-gastown-alpha");
    h.term.add_session("gt-gastown-beta");
    h.term.fail_next("nudge_session");

    let report = h
        .dispatcher
        .nudge("channel:pair", "hi", &NudgeOptions::default())
        .await
        .unwrap();
    assert!(!report.all_ok());
    assert_eq!(report.delivered.len(), 1);
    assert_eq!(report.failures.len(), 1);
}

#[tokio::test]
async fn unknown_channel_is_an_address_error() {
    let h = harness();
    let err = h
        .dispatcher
        .nudge("channel:ghosts", "hi", &NudgeOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unknown_address");
}

#[tokio::test]
async fn queued_mode_appends_reminder_to_queue_file() {
    let h = harness();
    h.term.add_session("gt-gastown-alpha");

    let report = h
        .dispatcher
        .nudge(
            "gastown/alpha",
            "rebase when free",
            &NudgeOptions { mode: DeliveryMode::Queued, ..NudgeOptions::default() },
        )
        .await
        .unwrap();
    assert!(report.all_ok());
    // Nothing typed into the pane.
    assert!(h.term.session("gt-gastown-alpha").unwrap().sent.is_empty());

    let drained = crate::queue::drain_queue(&h.dispatcher.ctx.town, "gt-gastown-alpha")
        .unwrap()
        .unwrap();
    assert!(drained.starts_with("<system-reminder>"));
    assert!(drained.contains("rebase when free"));
    assert!(drained.trim_end().ends_with("</system-reminder>"));
}

#[tokio::test]
async fn queued_mode_queues_even_for_idle_targets() {
    // The documented choice: no silent fallback to direct delivery.
    let h = harness();
    h.term.add_session("gt-gastown-alpha");
    h.term.with_session("gt-gastown-alpha", |s| s.idle = true);

    h.dispatcher
        .nudge(
            "gastown/alpha",
            "queued anyway",
            &NudgeOptions { mode: DeliveryMode::Queued, ..NudgeOptions::default() },
        )
        .await
        .unwrap();
    assert!(h.term.session("gt-gastown-alpha").unwrap().sent.is_empty());
    assert!(crate::queue::drain_queue(&h.dispatcher.ctx.town, "gt-gastown-alpha")
        .unwrap()
        .is_some());
}

#[tokio::test(start_paused = true)]
async fn delayed_mode_sleeps_then_sends() {
    let h = harness();
    h.term.add_session("gt-mayor");
    let report = h
        .dispatcher
        .nudge(
            "mayor",
            "later",
            &NudgeOptions {
                mode: DeliveryMode::Delayed(std::time::Duration::from_millis(250)),
                ..NudgeOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(report.delivered, vec!["mayor"]);
    assert_eq!(h.term.session("gt-mayor").unwrap().sent, vec!["later"]);
}

#[tokio::test(start_paused = true)]
async fn wait_ready_times_out_as_failure() {
    let h = harness();
    h.term.with_session("gt-mayor", |s| s.agent_alive = false);

    let report = h
        .dispatcher
        .nudge(
            "mayor",
            "anyone there?",
            &NudgeOptions {
                mode: DeliveryMode::WaitReady,
                wait_timeout: std::time::Duration::from_secs(2),
                ..NudgeOptions::default()
            },
        )
        .await
        .unwrap();
    assert!(!report.all_ok());
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].1.contains("timed out"));
}

#[tokio::test]
async fn merge_signals_deliver_as_nudges() {
    use gt_refinery::{MergeSignal, MergeSignaller};

    let h = harness();
    h.term.add_session("gt-gastown-furiosa");
    h.dispatcher
        .signal(
            "gastown/furiosa",
            MergeSignal::Merged { branch: "feature-x".into() },
        )
        .await
        .unwrap();
    let sent = h.term.session("gt-gastown-furiosa").unwrap().sent;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("feature-x"));
}

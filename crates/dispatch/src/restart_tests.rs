// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testutil::{harness, open_task, Harness};
use gt_beads::{slots, BeadStatus};
use gt_core::{NodeType, RigEntry, Rigs};

fn seed_rigs(h: &Harness) {
    let mut rigs = Rigs::default();
    rigs.rigs.insert(
        "gastown".into(),
        RigEntry {
            prefix: "gt".into(),
            crews: vec!["max".into()],
            polecat_pool: vec!["furiosa".into(), "nux".into()],
        },
    );
    rigs.save(&h.dispatcher.ctx.town.rigs_json()).unwrap();
}

fn seed_polecat_bead(h: &Harness, name: &str, hook: Option<&str>) {
    let mut bead = gt_beads::Bead::builder()
        .id(format!("gt-gastown-polecat-{name}"))
        .bead_type(NodeType::Agent)
        .build();
    bead.slots.insert(slots::ROLE_TYPE.to_string(), "polecat".to_string());
    bead.slots.insert(slots::RIG.to_string(), "gastown".to_string());
    if let Some(hook) = hook {
        bead.slots.insert(slots::HOOK_BEAD.to_string(), hook.to_string());
    }
    h.beads.insert(bead);
}

#[tokio::test]
async fn graceful_restart_stops_starts_and_restores() {
    let h = harness();
    seed_rigs(&h);
    seed_polecat_bead(&h, "furiosa", Some("gt-abc"));
    seed_polecat_bead(&h, "nux", None);
    h.beads.insert(open_task("gt-abc"));

    for session in ["gt-mayor", "gt-gastown-witness", "gt-gastown-furiosa", "vim"] {
        h.term.add_session(session);
    }

    let report = h.dispatcher.restart(&RestartOptions::default()).await.unwrap();
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    // Every Gas Town session stopped; vim untouched.
    assert_eq!(report.stopped.len(), 3);
    assert!(h.term.session("vim").is_some());

    // Configured set: mayor, deacon, witness, refinery, crew max.
    assert!(report.started.contains(&"gt-mayor".to_string()));
    assert!(report.started.contains(&"gt-deacon".to_string()));
    assert!(report.started.contains(&"gt-gastown-witness".to_string()));
    assert!(report.started.contains(&"gt-gastown-refinery".to_string()));
    assert!(report.started.contains(&"gt-gastown-crew-max".to_string()));

    // Only the polecat with a hook came back.
    assert_eq!(report.restored, vec!["gt-gastown-furiosa"]);
    assert!(h.term.session("gt-gastown-furiosa").is_some());
    assert!(h.term.session("gt-gastown-nux").is_none());
}

#[tokio::test]
async fn started_sessions_carry_identity_env() {
    let h = harness();
    seed_rigs(&h);
    h.dispatcher.up(&RestartOptions::default()).await.unwrap();

    let witness = h.term.session("gt-gastown-witness").unwrap();
    assert_eq!(witness.env.get("GT_ROLE").map(String::as_str), Some("witness"));
    assert_eq!(witness.env.get("GT_RIG").map(String::as_str), Some("gastown"));
    assert_eq!(witness.command.as_deref(), Some("claude"));
    assert_eq!(
        witness.workdir.as_deref(),
        Some(h.dispatcher.ctx.town.rig_dir("gastown").as_path())
    );

    let crew = h.term.session("gt-gastown-crew-max").unwrap();
    assert_eq!(crew.env.get("GT_CREW").map(String::as_str), Some("max"));

    let mayor = h.term.session("gt-mayor").unwrap();
    assert_eq!(mayor.env.get("GT_RIG"), None);
    assert_eq!(
        mayor.workdir.as_deref(),
        Some(h.dispatcher.ctx.town.root())
    );
}

#[tokio::test]
async fn infra_scope_skips_workers() {
    let h = harness();
    seed_rigs(&h);
    for session in ["gt-mayor", "gt-gastown-furiosa", "gt-gastown-crew-max"] {
        h.term.add_session(session);
    }

    let opts = RestartOptions { infra_only: true, ..RestartOptions::default() };
    let report = h.dispatcher.down(&opts).await.unwrap();
    assert_eq!(report.stopped, vec!["gt-mayor"]);
    // Workers were left running.
    assert!(h.term.session("gt-gastown-furiosa").is_some());
    assert!(h.term.session("gt-gastown-crew-max").is_some());

    let report = h.dispatcher.up(&opts).await.unwrap();
    assert!(report.started.contains(&"gt-gastown-witness".to_string()));
    assert!(!report.started.iter().any(|s| s.contains("crew")));
}

#[tokio::test]
async fn clean_strategy_does_not_restore_polecats() {
    let h = harness();
    seed_rigs(&h);
    seed_polecat_bead(&h, "furiosa", Some("gt-abc"));
    h.term.add_session("gt-gastown-furiosa");

    let opts = RestartOptions { strategy: RestartStrategy::Clean, ..RestartOptions::default() };
    let report = h.dispatcher.restart(&opts).await.unwrap();
    assert!(report.restored.is_empty());
    assert!(h.term.session("gt-gastown-furiosa").is_none());
}

#[tokio::test]
async fn up_is_idempotent_for_running_sessions() {
    let h = harness();
    seed_rigs(&h);
    h.dispatcher.up(&RestartOptions::default()).await.unwrap();
    h.term.with_session("gt-mayor", |s| {
        s.env.insert("MARKER".into(), "kept".into());
    });

    h.dispatcher.up(&RestartOptions::default()).await.unwrap();
    // The running session was not recreated.
    assert_eq!(
        h.term.session("gt-mayor").unwrap().env.get("MARKER").map(String::as_str),
        Some("kept")
    );
}

#[tokio::test(start_paused = true)]
async fn drain_waits_until_hooks_empty() {
    let h = harness();
    seed_rigs(&h);
    seed_polecat_bead(&h, "furiosa", Some("gt-abc"));
    h.term.add_session("gt-gastown-furiosa");

    let beads = h.beads.clone();
    let unhook = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(12)).await;
        beads
            .set_slot("gt-gastown-polecat-furiosa", slots::HOOK_BEAD, "")
            .await
            .unwrap();
    });

    let opts = RestartOptions { strategy: RestartStrategy::Drain, ..RestartOptions::default() };
    let report = h.dispatcher.restart(&opts).await.unwrap();
    unhook.await.unwrap();
    assert!(report.stopped.contains(&"gt-gastown-furiosa".to_string()));
}

#[tokio::test]
async fn strategy_parse_round_trips() {
    for strategy in [
        RestartStrategy::Graceful,
        RestartStrategy::Drain,
        RestartStrategy::Immediate,
        RestartStrategy::Clean,
    ] {
        assert_eq!(RestartStrategy::parse(&strategy.to_string()), Some(strategy));
    }
    assert_eq!(RestartStrategy::parse("violent"), None);
}

#[tokio::test]
async fn hooked_polecats_skips_malformed_beads() {
    let h = harness();
    seed_rigs(&h);
    // Agent bead with a hook but no polecat name in its id.
    let mut bead = gt_beads::Bead::builder()
        .id("gt-gastown-weird")
        .bead_type(NodeType::Agent)
        .build();
    bead.slots.insert(slots::ROLE_TYPE.to_string(), "polecat".to_string());
    bead.slots.insert(slots::RIG.to_string(), "gastown".to_string());
    bead.slots.insert(slots::HOOK_BEAD.to_string(), "gt-abc".to_string());
    h.beads.insert(bead);

    let report = h.dispatcher.restart(&RestartOptions::default()).await.unwrap();
    assert!(report.restored.is_empty());
}

#[tokio::test]
async fn graceful_restart_keeps_hook_state() {
    // The restored polecat's bead still carries its hook; nothing clears it.
    let h = harness();
    seed_rigs(&h);
    seed_polecat_bead(&h, "furiosa", Some("gt-abc"));
    h.term.add_session("gt-gastown-furiosa");

    h.dispatcher.restart(&RestartOptions::default()).await.unwrap();
    let bead = h.beads.get("gt-gastown-polecat-furiosa").unwrap();
    assert_eq!(bead.slot(slots::HOOK_BEAD), Some("gt-abc"));
}

#[tokio::test]
async fn restart_with_unavailable_store_fails() {
    let h = harness();
    seed_rigs(&h);
    h.beads.fail_next("list_by_type_status");
    let err = h.dispatcher.restart(&RestartOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), "store_unavailable");
}

#[tokio::test]
async fn restored_polecat_session_is_live() {
    let h = harness();
    seed_rigs(&h);
    seed_polecat_bead(&h, "furiosa", Some("gt-abc"));

    h.dispatcher.restart(&RestartOptions::default()).await.unwrap();
    let session = h.term.session("gt-gastown-furiosa").unwrap();
    assert_eq!(session.env.get("GT_POLECAT").map(String::as_str), Some("furiosa"));
    assert_eq!(session.env.get("GT_ROLE").map(String::as_str), Some("polecat"));
}

#[tokio::test]
async fn work_bead_untouched_by_restart() {
    let h = harness();
    seed_rigs(&h);
    seed_polecat_bead(&h, "furiosa", Some("gt-abc"));
    let mut bead = open_task("gt-abc");
    bead.status = BeadStatus::Hooked;
    h.beads.insert(bead);

    h.dispatcher.restart(&RestartOptions::default()).await.unwrap();
    assert_eq!(h.beads.get("gt-abc").unwrap().status, BeadStatus::Hooked);
}

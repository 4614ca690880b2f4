// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn insert_validates_prefix_shape() {
    let mut routes = Routes::new();
    routes.insert("gastown", "gt").unwrap();
    routes.insert("hardware", "hdwr").unwrap();
    assert!(routes.insert("bad", "x").is_err());
    assert!(routes.insert("bad", "toolong").is_err());
    assert!(routes.insert("bad", "GT").is_err());
    assert!(routes.insert("bad", "g1").is_err());
}

#[test]
fn lookup_both_directions() {
    let routes = Routes::from_pairs([("gastown", "gt"), ("beads", "bd")]);
    assert_eq!(routes.prefix_for("gastown"), Some("gt"));
    assert_eq!(routes.prefix_for("nope"), None);
    assert_eq!(routes.rig_for_prefix("bd"), Some("beads"));
    assert_eq!(routes.rig_for_prefix("zz"), None);
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("routes.json");
    let routes = Routes::from_pairs([("gastown", "gt")]);
    routes.save(&path).unwrap();
    assert_eq!(Routes::load(&path).unwrap(), routes);
}

#[test]
fn rigs_registry_derives_routes() {
    let mut rigs = Rigs::default();
    rigs.rigs.insert(
        "gastown".into(),
        RigEntry { prefix: "gt".into(), crews: vec!["max".into()], polecat_pool: vec![] },
    );
    let routes = rigs.to_routes();
    assert_eq!(routes.prefix_for("gastown"), Some("gt"));
}

#[test]
fn rigs_round_trip_preserves_crews() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rigs.json");
    let mut rigs = Rigs::default();
    rigs.rigs.insert(
        "gastown".into(),
        RigEntry {
            prefix: "gt".into(),
            crews: vec!["max".into(), "ace".into()],
            polecat_pool: vec!["furiosa".into()],
        },
    );
    rigs.save(&path).unwrap();
    let loaded = Rigs::load(&path).unwrap();
    assert_eq!(loaded, rigs);
    assert_eq!(loaded.get("gastown").unwrap().crews.len(), 2);
}

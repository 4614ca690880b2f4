// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

fn routes() -> Routes {
    Routes::from_pairs([("gastown", "gt"), ("beads", "bd"), ("hardware", "hw")])
}

#[parameterized(
    mayor = { "mayor", AgentAddress::Mayor },
    deacon = { "deacon", AgentAddress::Deacon },
    witness = { "gastown/witness", AgentAddress::Witness { rig: "gastown".into() } },
    refinery = { "gastown/refinery", AgentAddress::Refinery { rig: "gastown".into() } },
    polecat = { "gastown/furiosa", AgentAddress::Polecat { rig: "gastown".into(), name: "furiosa".into() } },
    crew = { "gastown/crew/max", AgentAddress::Crew { rig: "gastown".into(), name: "max".into() } },
)]
fn parse_valid_shapes(input: &str, expected: AgentAddress) {
    assert_eq!(AgentAddress::parse(input).unwrap(), expected);
}

#[parameterized(
    empty = { "" },
    bare_slash = { "/" },
    too_deep = { "gastown/crew/max/extra" },
    uppercase_rig = { "Gastown/furiosa" },
    reserved_polecat = { "gastown/witness/extra" },
    empty_name = { "gastown/" },
)]
fn parse_rejects_bad_shapes(input: &str) {
    assert!(AgentAddress::parse(input).is_err());
}

#[test]
fn parse_rejects_reserved_worker_names() {
    // A polecat may not shadow singleton roles or the crew namespace.
    assert_eq!(
        AgentAddress::parse("gastown/crew"),
        Err(AddressError::InvalidName("crew".into()))
    );
    assert_eq!(
        AgentAddress::parse("gastown/mayor"),
        Err(AddressError::InvalidName("mayor".into()))
    );
}

#[parameterized(
    mayor = { "mayor", "gt-mayor" },
    deacon = { "deacon", "gt-deacon" },
    witness = { "gastown/witness", "gt-gastown-witness" },
    refinery = { "gastown/refinery", "gt-gastown-refinery" },
    polecat = { "gastown/furiosa", "gt-gastown-furiosa" },
    crew = { "gastown/crew/max", "gt-gastown-crew-max" },
)]
fn session_names(addr: &str, session: &str) {
    assert_eq!(AgentAddress::parse(addr).unwrap().session_name(), session);
}

#[parameterized(
    mayor = { "mayor", "gt-mayor" },
    witness = { "gastown/witness", "gt-gastown-witness" },
    polecat = { "gastown/furiosa", "gt-gastown-polecat-furiosa" },
    crew = { "gastown/crew/max", "gt-gastown-crew-max" },
    other_rig = { "beads/gamma", "bd-beads-polecat-gamma" },
)]
fn bead_ids(addr: &str, bead: &str) {
    let addr = AgentAddress::parse(addr).unwrap();
    assert_eq!(addr.bead_id(&routes()).unwrap(), bead);
}

#[test]
fn bead_id_requires_known_rig() {
    let addr = AgentAddress::parse("unknown/furiosa").unwrap();
    assert_eq!(
        addr.bead_id(&routes()),
        Err(AddressError::UnknownRig("unknown".into()))
    );
}

#[test]
fn from_session_round_trips_all_shapes() {
    for addr in [
        "mayor",
        "deacon",
        "gastown/witness",
        "gastown/refinery",
        "gastown/furiosa",
        "gastown/crew/max",
    ] {
        let parsed = AgentAddress::parse(addr).unwrap();
        let session = parsed.session_name();
        assert_eq!(
            AgentAddress::from_session(&session, &routes()),
            Some(parsed),
            "round trip failed for {addr}"
        );
    }
}

#[test]
fn from_session_rejects_foreign_and_boot() {
    let r = routes();
    assert_eq!(AgentAddress::from_session("vim", &r), None);
    assert_eq!(AgentAddress::from_session("gt-boot", &r), None);
    assert_eq!(AgentAddress::from_session("gt-unknownrig-furiosa", &r), None);
    assert_eq!(AgentAddress::from_session("gt-", &r), None);
}

#[test]
fn crew_session_never_misread_as_polecat() {
    let addr = AgentAddress::from_session("gt-gastown-crew-max", &routes()).unwrap();
    assert_eq!(
        addr,
        AgentAddress::Crew { rig: "gastown".into(), name: "max".into() }
    );
}

#[test]
fn longest_rig_wins_classification() {
    let r = Routes::from_pairs([("gas", "ga"), ("gas-town", "gt")]);
    let addr = AgentAddress::from_session("gt-gas-town-witness", &r).unwrap();
    assert_eq!(addr, AgentAddress::Witness { rig: "gas-town".into() });
}

#[test]
fn serde_round_trip() {
    let addr = AgentAddress::parse("gastown/crew/max").unwrap();
    let json = serde_json::to_string(&addr).unwrap();
    assert_eq!(json, "\"gastown/crew/max\"");
    let back: AgentAddress = serde_json::from_str(&json).unwrap();
    assert_eq!(back, addr);
}

#[test]
fn infra_roles() {
    assert!(Role::Mayor.is_infra());
    assert!(Role::Refinery.is_infra());
    assert!(!Role::Polecat.is_infra());
    assert!(!Role::Crew.is_infra());
}

fn token_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,6}"
}

proptest! {
    #[test]
    fn session_round_trip_holds(rig in token_strategy(), name in token_strategy()) {
        prop_assume!(!super::RESERVED_WORKER_NAMES.contains(&name.as_str()));
        let routes = Routes::from_pairs([(rig.as_str(), "zz")]);
        for addr in [
            AgentAddress::Witness { rig: rig.clone() },
            AgentAddress::Refinery { rig: rig.clone() },
            AgentAddress::Polecat { rig: rig.clone(), name: name.clone() },
            AgentAddress::Crew { rig: rig.clone(), name: name.clone() },
        ] {
            let session = addr.session_name();
            prop_assert_eq!(AgentAddress::from_session(&session, &routes), Some(addr));
        }
    }

    #[test]
    fn bead_ids_injective(rig in token_strategy(), a in token_strategy(), b in token_strategy()) {
        prop_assume!(a != b);
        prop_assume!(!super::RESERVED_WORKER_NAMES.contains(&a.as_str()));
        prop_assume!(!super::RESERVED_WORKER_NAMES.contains(&b.as_str()));
        let routes = Routes::from_pairs([(rig.as_str(), "zz")]);
        let lhs = AgentAddress::Polecat { rig: rig.clone(), name: a.clone() };
        let rhs = AgentAddress::Polecat { rig: rig.clone(), name: b.clone() };
        prop_assert_ne!(lhs.bead_id(&routes).unwrap(), rhs.bead_id(&routes).unwrap());
        let crew_a = AgentAddress::Crew { rig: rig.clone(), name: a.clone() };
        prop_assert_ne!(crew_a.bead_id(&routes).unwrap(), lhs.bead_id(&routes).unwrap());
    }
}

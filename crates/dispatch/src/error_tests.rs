// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn hook_conflict() -> DispatchError {
    DispatchError::HookConflict {
        target: "gastown/furiosa".to_string(),
        existing: "gt-abc".to_string(),
    }
}

#[parameterized(
    not_in_workspace = { DispatchError::NotInWorkspace, "not_in_workspace" },
    unknown_address = { DispatchError::UnknownAddress("x".into()), "unknown_address" },
    lock = { DispatchError::LockContention { bead: "gt-abc".into() }, "lock_contention" },
    not_found = { DispatchError::Store(BeadsError::NotFound("gt-x".into())), "store_not_found" },
    unavailable = { DispatchError::Store(BeadsError::Unavailable("down".into())), "store_unavailable" },
    cancelled = { DispatchError::Cancelled, "cancelled" },
    timeout = { DispatchError::Timeout(Duration::from_secs(60)), "timeout" },
)]
fn kinds_are_stable(err: DispatchError, kind: &str) {
    assert_eq!(err.kind(), kind);
}

#[test]
fn hook_conflict_hints_at_force() {
    let err = hook_conflict();
    assert_eq!(err.kind(), "hook_conflict");
    assert!(err.hints().iter().any(|h| h.contains("--force")));
}

#[test]
fn json_shape_carries_kind_message_hints() {
    let value = hook_conflict().to_json();
    assert_eq!(value["error"]["kind"], "hook_conflict");
    assert!(value["error"]["message"]
        .as_str()
        .unwrap()
        .contains("gastown/furiosa"));
    assert!(value["error"]["hints"].is_array());
}

#[test]
fn cycle_errors_report_the_path() {
    let err = DispatchError::Cycle(CycleError {
        path: vec!["t-0".into(), "t-1".into(), "t-0".into()],
    });
    assert_eq!(err.kind(), "cycle_detected");
    assert!(err.to_string().contains("t-0 -> t-1 -> t-0"));
    assert!(!err.hints().is_empty());
}

#[test]
fn address_errors_become_unknown_address() {
    let parse_err = gt_core::AgentAddress::parse("no/such/shape/here").unwrap_err();
    let err: DispatchError = parse_err.into();
    assert_eq!(err.kind(), "unknown_address");
}

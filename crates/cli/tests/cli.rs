// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end CLI smoke tests: argument surface and workspace discovery.
//! Anything touching tmux or the store is covered by dispatcher tests.

use assert_cmd::Command;

fn gt() -> Command {
    let mut cmd = Command::cargo_bin("gt").expect("gt binary");
    cmd.env_remove("GT_ROOT")
        .env_remove("GT_ROLE")
        .env_remove("GT_RIG");
    cmd
}

#[test]
fn help_lists_core_commands() {
    let assert = gt().arg("--help").assert().success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    for command in ["sling", "nudge", "mail", "quota", "restart", "workload", "refinery"] {
        assert!(output.contains(command), "help should mention {command}");
    }
}

#[test]
fn outside_a_town_is_a_user_error() {
    let dir = tempfile::tempdir().unwrap();
    gt().current_dir(dir.path())
        .args(["workload", "gastown/furiosa"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicates::str::contains("not inside a Gas Town workspace"));
}

#[test]
fn json_error_shape_outside_town() {
    let dir = tempfile::tempdir().unwrap();
    let assert = gt()
        .current_dir(dir.path())
        .args(["--json", "workload", "gastown/furiosa"])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    let value: serde_json::Value = serde_json::from_str(stderr.trim()).unwrap();
    assert_eq!(value["error"]["kind"], "not_in_workspace");
    assert!(value["error"]["hints"].is_array());
}

#[test]
fn unknown_strategy_is_rejected_at_parse_time() {
    gt().args(["restart", "--strategy", "violent"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("unknown strategy"));
}

#[test]
fn sling_requires_bead_and_target() {
    gt().arg("sling").assert().failure().code(2);
}

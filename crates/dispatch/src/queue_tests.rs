// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gt_core::Town;

fn town() -> (tempfile::TempDir, Town) {
    let dir = tempfile::tempdir().unwrap();
    let town = Town::at(dir.path());
    (dir, town)
}

#[test]
fn drain_of_empty_queue_is_none() {
    let (_dir, town) = town();
    assert_eq!(drain_queue(&town, "gt-gastown-alpha").unwrap(), None);
}

#[test]
fn messages_append_in_order_and_drain_clears() {
    let (_dir, town) = town();
    queue_message(&town, "gt-gastown-alpha", "mayor", "first").unwrap();
    queue_message(&town, "gt-gastown-alpha", "gastown/witness", "second").unwrap();

    let content = drain_queue(&town, "gt-gastown-alpha").unwrap().unwrap();
    let first = content.find("first").unwrap();
    let second = content.find("second").unwrap();
    assert!(first < second);
    assert!(content.contains("Message from mayor: first"));
    assert!(content.contains("Message from gastown/witness: second"));
    assert_eq!(content.matches("<system-reminder>").count(), 2);
    assert_eq!(content.matches("</system-reminder>").count(), 2);

    // Drained means gone.
    assert_eq!(drain_queue(&town, "gt-gastown-alpha").unwrap(), None);
}

#[test]
fn queues_are_per_session() {
    let (_dir, town) = town();
    queue_message(&town, "gt-gastown-alpha", "mayor", "for alpha").unwrap();
    assert_eq!(drain_queue(&town, "gt-gastown-beta").unwrap(), None);
    assert!(drain_queue(&town, "gt-gastown-alpha").unwrap().is_some());
}

#[test]
fn reminder_block_is_literal_tags() {
    let block = system_reminder("mayor", "hello");
    assert_eq!(
        block,
        "<system-reminder>\nMessage from mayor: hello\n</system-reminder>\n"
    );
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn system_clock_advances() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
    assert!(clock.epoch_ms() > 0);
}

#[test]
fn fake_clock_advance_moves_both_times() {
    let clock = FakeClock::new();
    let before_instant = clock.now();
    let before_ms = clock.epoch_ms();

    clock.advance(Duration::from_secs(31));

    assert_eq!(clock.now() - before_instant, Duration::from_secs(31));
    assert_eq!(clock.epoch_ms() - before_ms, 31_000);
}

#[test]
fn fake_clock_utc_follows_epoch_ms() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    assert_eq!(clock.utc().timestamp_millis(), 1_700_000_000_000);
}

#[test]
fn fake_clock_clones_share_state() {
    let a = FakeClock::new();
    let b = a.clone();
    a.advance(Duration::from_secs(5));
    assert_eq!(a.epoch_ms(), b.epoch_ms());
}

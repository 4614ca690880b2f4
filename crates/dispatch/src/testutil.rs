// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for dispatcher tests.

use gt_adapters::FakeTerminal;
use gt_beads::{Bead, BeadStatus, FakeBeads};
use gt_core::{AgentAddress, FakeClock, GtContext, Routes, Town};

use crate::dispatcher::Dispatcher;

pub(crate) struct Harness {
    pub dispatcher: Dispatcher<FakeBeads, FakeTerminal, FakeClock>,
    pub beads: FakeBeads,
    pub term: FakeTerminal,
    pub clock: FakeClock,
    // Kept alive for the town root on disk.
    pub town_dir: tempfile::TempDir,
}

/// Fresh dispatcher over fakes and a temp town with two routed rigs.
pub(crate) fn harness() -> Harness {
    let town_dir = tempfile::tempdir().expect("tempdir");
    let town = Town::at(town_dir.path());
    let routes = Routes::from_pairs([("gastown", "gt"), ("beads", "bd")]);
    let ctx = GtContext { town, routes, identity: None };

    let beads = FakeBeads::new();
    let term = FakeTerminal::new();
    let clock = FakeClock::new();
    let dispatcher = Dispatcher::new(ctx, beads.clone(), term.clone(), clock.clone());
    Harness { dispatcher, beads, term, clock, town_dir }
}

/// An open task bead ready to sling.
pub(crate) fn open_task(id: &str) -> Bead {
    Bead::builder().id(id).title(format!("task {id}")).build()
}

/// Look up the hook slot of an agent's bead.
pub(crate) fn hook_of(h: &Harness, addr: &str) -> Option<String> {
    let addr = AgentAddress::parse(addr).expect("addr");
    let bead_id = addr.bead_id(&h.dispatcher.ctx.routes).expect("bead id");
    h.beads
        .get(&bead_id)
        .and_then(|b| b.slot(gt_beads::slots::HOOK_BEAD).map(str::to_string))
}

/// Status of a bead in the fake store.
pub(crate) fn status_of(h: &Harness, id: &str) -> BeadStatus {
    h.beads.get(id).expect("bead").status
}

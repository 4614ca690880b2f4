// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gt-beads: typed gateway to the external issue store.
//!
//! Every read and write of a bead goes through the [`BeadsGateway`] trait.
//! The production implementation shells out to the `bd` binary with `--json`
//! output; tests run against the in-memory [`FakeBeads`] store. The gateway
//! is a facade: it knows bead shapes and which store directory a bead id
//! routes to, nothing about dispatch policy.

pub mod bead;
pub mod cli;
pub mod error;
pub mod gateway;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use bead::{slots, AgentBead, Bead, BeadRef, BeadStatus, CreateBead, StoreScope};
pub use cli::BdCli;
pub use error::BeadsError;
pub use gateway::BeadsGateway;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBeads;

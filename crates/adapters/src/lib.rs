// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gt-adapters: terminal backends behind one trait.
//!
//! The dispatcher only sees [`TerminalBackend`]. The local implementation
//! drives tmux; the remote one execs into an agent pod whose tmux session
//! key is `claude`. The reliable-delivery contract (literal paste, 500 ms
//! gap, Enter as a separate event) belongs to the trait, not to any one
//! implementation.

pub mod error;
pub mod router;
pub mod terminal;

pub use error::BackendError;
pub use router::RoutedBackend;
pub use terminal::pod::PodBackend;
pub use terminal::tmux::TmuxBackend;
pub use terminal::{TerminalBackend, NUDGE_PASTE_DELAY};

#[cfg(any(test, feature = "test-support"))]
pub use terminal::fake::{FakeSession, FakeTerminal};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher configuration context.
//!
//! One `GtContext` is built at process start from the environment and the
//! town's config files, then threaded through every dispatcher entry point.
//! Nothing else in the core reads identity env vars directly.

use std::path::Path;

use crate::address::{AgentAddress, Role};
use crate::routes::Routes;
use crate::town::{Town, TownError};

/// The caller's own identity, when running inside an agent session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub address: AgentAddress,
}

impl Identity {
    /// Resolve identity from `GT_ROLE` / `GT_RIG` / `GT_POLECAT` / `GT_CREW`.
    ///
    /// Returns `None` when the role is unset or does not form a complete
    /// address (e.g. `GT_ROLE=polecat` without `GT_POLECAT`).
    pub fn from_env() -> Option<Identity> {
        let role = Role::parse(&std::env::var("GT_ROLE").ok()?)?;
        let rig = std::env::var("GT_RIG").unwrap_or_default();
        let address = match role {
            Role::Mayor => AgentAddress::Mayor,
            Role::Deacon => AgentAddress::Deacon,
            Role::Witness if !rig.is_empty() => AgentAddress::Witness { rig },
            Role::Refinery if !rig.is_empty() => AgentAddress::Refinery { rig },
            Role::Polecat if !rig.is_empty() => AgentAddress::Polecat {
                rig,
                name: std::env::var("GT_POLECAT").ok().filter(|n| !n.is_empty())?,
            },
            Role::Crew if !rig.is_empty() => AgentAddress::Crew {
                rig,
                name: std::env::var("GT_CREW").ok().filter(|n| !n.is_empty())?,
            },
            _ => return None,
        };
        Some(Identity { address })
    }
}

/// Configuration threaded through dispatcher operations.
#[derive(Debug, Clone)]
pub struct GtContext {
    pub town: Town,
    pub routes: Routes,
    pub identity: Option<Identity>,
}

impl GtContext {
    /// Discover the town from `start`, load the routes table, and resolve
    /// the caller's identity from the environment.
    pub fn load(start: &Path) -> Result<GtContext, TownError> {
        let town = Town::discover(start)?;
        let routes = match Routes::load(&town.routes_json()) {
            Ok(routes) => routes,
            Err(e) => {
                tracing::debug!(error = %e, "no routes table; using empty");
                Routes::new()
            }
        };
        Ok(GtContext {
            town,
            routes,
            identity: Identity::from_env(),
        })
    }

    /// The rig the caller is operating in, from identity.
    ///
    /// Role shortcuts like `nudge witness` resolve against this.
    pub fn current_rig(&self) -> Option<&str> {
        self.identity.as_ref().and_then(|i| i.address.rig())
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

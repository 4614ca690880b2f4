// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent session registry: the derived read view over live sessions.
//!
//! The registry never talks to tmux itself; callers hand it the raw session
//! name list and it classifies, filters, and sorts. Pure function of the
//! inputs and the routes table.

use serde::Serialize;

use crate::address::{AgentAddress, Role};
use crate::routes::Routes;

/// One classified live agent session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentInfo {
    pub address: AgentAddress,
    pub session: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rig: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AgentInfo {
    fn from_address(address: AgentAddress, session: String) -> AgentInfo {
        AgentInfo {
            role: address.role(),
            rig: address.rig().map(str::to_string),
            name: address.worker_name().map(str::to_string),
            session,
            address,
        }
    }

    /// Sort key: mayor, deacon, then per rig (by rig name) refinery,
    /// witness, crew by name, polecat by name.
    fn sort_key(&self) -> (u8, String, u8, String) {
        let (class, sub) = match self.role {
            Role::Mayor => (0, 0),
            Role::Deacon => (1, 0),
            Role::Refinery => (2, 0),
            Role::Witness => (2, 1),
            Role::Crew => (2, 2),
            Role::Polecat => (2, 3),
        };
        (
            class,
            self.rig.clone().unwrap_or_default(),
            sub,
            self.name.clone().unwrap_or_default(),
        )
    }
}

/// Classify, filter, and deterministically order raw session names.
///
/// Non-Gas-Town names and the reserved boot session are dropped; polecats
/// are dropped unless `include_polecats`.
pub fn filter_and_sort_sessions(
    names: &[String],
    include_polecats: bool,
    routes: &Routes,
) -> Vec<AgentInfo> {
    let mut agents: Vec<AgentInfo> = names
        .iter()
        .filter_map(|name| {
            let addr = AgentAddress::from_session(name, routes)?;
            if !include_polecats && addr.role() == Role::Polecat {
                return None;
            }
            Some(AgentInfo::from_address(addr, name.clone()))
        })
        .collect();
    agents.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    agents
}

/// Picker shortcut for the i-th listed agent: `1`–`9`, then `a`–`z`,
/// then nothing.
pub fn shortcut_key(i: usize) -> Option<char> {
    match i {
        0..=8 => char::from_digit(i as u32 + 1, 10),
        9..=34 => char::from_u32('a' as u32 + (i as u32 - 9)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

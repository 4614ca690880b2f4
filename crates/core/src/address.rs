// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent addressing: roles, display addresses, session names, bead ids.
//!
//! An address is the short display form used everywhere humans name an agent
//! (`mayor`, `gastown/witness`, `gastown/crew/max`). Every valid address maps
//! injectively to a tmux session name and, given the routes table, to an
//! agent bead id. The mapping is total and deterministic; the inverse
//! (session name back to address) rejects sessions that do not belong to
//! Gas Town.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::routes::Routes;

/// Prefix carried by every Gas Town session name.
pub const SESSION_PREFIX: &str = "gt-";

/// Session name reserved for the bootstrap shell; never a live agent.
pub const RESERVED_BOOT_SESSION: &str = "gt-boot";

/// Errors from parsing or resolving an address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("unrecognized address: {0:?}")]
    Unparseable(String),
    #[error("invalid name in address: {0:?}")]
    InvalidName(String),
    #[error("unknown rig: {0:?}")]
    UnknownRig(String),
}

/// The six agent roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Mayor,
    Deacon,
    Witness,
    Refinery,
    Polecat,
    Crew,
}

crate::simple_display! {
    Role {
        Mayor => "mayor",
        Deacon => "deacon",
        Witness => "witness",
        Refinery => "refinery",
        Polecat => "polecat",
        Crew => "crew",
    }
}

impl Role {
    /// Parse a role name as used in `GT_ROLE` and agent bead slots.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "mayor" => Some(Role::Mayor),
            "deacon" => Some(Role::Deacon),
            "witness" => Some(Role::Witness),
            "refinery" => Some(Role::Refinery),
            "polecat" => Some(Role::Polecat),
            "crew" => Some(Role::Crew),
            _ => None,
        }
    }

    /// Town-scoped singleton roles live at the town root, not inside a rig.
    pub fn is_town_scoped(&self) -> bool {
        matches!(self, Role::Mayor | Role::Deacon)
    }

    /// Infrastructure roles: town singletons plus the per-rig singletons.
    /// Used by `restart --infra` to narrow its scope.
    pub fn is_infra(&self) -> bool {
        matches!(self, Role::Mayor | Role::Deacon | Role::Witness | Role::Refinery)
    }
}

/// A fully-resolved agent address.
///
/// The display form is the canonical user-facing spelling; `session_name`
/// and `bead_id` derive the other two namespaces from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentAddress {
    Mayor,
    Deacon,
    Witness { rig: String },
    Refinery { rig: String },
    Polecat { rig: String, name: String },
    Crew { rig: String, name: String },
}

/// Names that cannot be used for polecats; they would collide with other
/// address shapes under the session-name mapping.
const RESERVED_WORKER_NAMES: &[&str] = &["witness", "refinery", "crew", "mayor", "deacon"];

fn valid_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().next().is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        && s.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

impl AgentAddress {
    /// Parse one of the six address shapes.
    ///
    /// Pure over strings; rig existence is only checked when a bead id is
    /// derived (that needs the routes table).
    pub fn parse(s: &str) -> Result<AgentAddress, AddressError> {
        match s {
            "mayor" => return Ok(AgentAddress::Mayor),
            "deacon" => return Ok(AgentAddress::Deacon),
            _ => {}
        }

        let parts: Vec<&str> = s.split('/').collect();
        let addr = match parts.as_slice() {
            [rig, "witness"] => AgentAddress::Witness { rig: (*rig).to_string() },
            [rig, "refinery"] => AgentAddress::Refinery { rig: (*rig).to_string() },
            [rig, "crew", name] => AgentAddress::Crew {
                rig: (*rig).to_string(),
                name: (*name).to_string(),
            },
            [rig, name] => {
                if RESERVED_WORKER_NAMES.contains(name) {
                    return Err(AddressError::InvalidName((*name).to_string()));
                }
                AgentAddress::Polecat {
                    rig: (*rig).to_string(),
                    name: (*name).to_string(),
                }
            }
            _ => return Err(AddressError::Unparseable(s.to_string())),
        };

        if !valid_token(addr.rig().unwrap_or("x")) {
            return Err(AddressError::InvalidName(s.to_string()));
        }
        if let Some(name) = addr.worker_name() {
            if !valid_token(name) {
                return Err(AddressError::InvalidName(name.to_string()));
            }
        }
        Ok(addr)
    }

    pub fn role(&self) -> Role {
        match self {
            AgentAddress::Mayor => Role::Mayor,
            AgentAddress::Deacon => Role::Deacon,
            AgentAddress::Witness { .. } => Role::Witness,
            AgentAddress::Refinery { .. } => Role::Refinery,
            AgentAddress::Polecat { .. } => Role::Polecat,
            AgentAddress::Crew { .. } => Role::Crew,
        }
    }

    /// Rig this agent belongs to; `None` for town-scoped roles.
    pub fn rig(&self) -> Option<&str> {
        match self {
            AgentAddress::Mayor | AgentAddress::Deacon => None,
            AgentAddress::Witness { rig }
            | AgentAddress::Refinery { rig }
            | AgentAddress::Polecat { rig, .. }
            | AgentAddress::Crew { rig, .. } => Some(rig),
        }
    }

    /// Individual worker name; `None` for singleton roles.
    pub fn worker_name(&self) -> Option<&str> {
        match self {
            AgentAddress::Polecat { name, .. } | AgentAddress::Crew { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Tmux session name for this agent. Total for every valid address.
    pub fn session_name(&self) -> String {
        match self {
            AgentAddress::Mayor => "gt-mayor".to_string(),
            AgentAddress::Deacon => "gt-deacon".to_string(),
            AgentAddress::Witness { rig } => format!("gt-{rig}-witness"),
            AgentAddress::Refinery { rig } => format!("gt-{rig}-refinery"),
            AgentAddress::Polecat { rig, name } => format!("gt-{rig}-{name}"),
            AgentAddress::Crew { rig, name } => format!("gt-{rig}-crew-{name}"),
        }
    }

    /// Agent bead id for this agent. Rig-scoped ids start with the rig's
    /// prefix from the routes table.
    pub fn bead_id(&self, routes: &Routes) -> Result<String, AddressError> {
        let prefix_for = |rig: &str| {
            routes
                .prefix_for(rig)
                .ok_or_else(|| AddressError::UnknownRig(rig.to_string()))
        };
        Ok(match self {
            AgentAddress::Mayor => "gt-mayor".to_string(),
            AgentAddress::Deacon => "gt-deacon".to_string(),
            AgentAddress::Witness { rig } => format!("{}-{rig}-witness", prefix_for(rig)?),
            AgentAddress::Refinery { rig } => format!("{}-{rig}-refinery", prefix_for(rig)?),
            AgentAddress::Polecat { rig, name } => {
                format!("{}-{rig}-polecat-{name}", prefix_for(rig)?)
            }
            AgentAddress::Crew { rig, name } => format!("{}-{rig}-crew-{name}", prefix_for(rig)?),
        })
    }

    /// Classify a session name back into an address.
    ///
    /// Checks the most specific patterns first: town singletons, then per
    /// rig (longest rig name first) witness/refinery, then crew, then bare
    /// polecat, so `gt-<rig>-crew-<x>` is never misread as a polecat named
    /// `crew-<x>`. Returns `None` for the reserved boot session, sessions
    /// whose rig is not in the routes table, and non-Gas-Town sessions.
    pub fn from_session(session: &str, routes: &Routes) -> Option<AgentAddress> {
        if session == RESERVED_BOOT_SESSION {
            return None;
        }
        match session {
            "gt-mayor" => return Some(AgentAddress::Mayor),
            "gt-deacon" => return Some(AgentAddress::Deacon),
            _ => {}
        }
        let rest = session.strip_prefix(SESSION_PREFIX)?;

        // Longest rig first so a rig name containing '-' wins over a shorter
        // rig that happens to be its prefix.
        let mut rigs: Vec<&str> = routes.rigs().collect();
        rigs.sort_by_key(|r| (std::cmp::Reverse(r.len()), *r));

        for rig in rigs {
            let Some(tail) = rest
                .strip_prefix(rig)
                .and_then(|t| t.strip_prefix('-'))
            else {
                continue;
            };
            let addr = match tail {
                "witness" => AgentAddress::Witness { rig: rig.to_string() },
                "refinery" => AgentAddress::Refinery { rig: rig.to_string() },
                _ => match tail.strip_prefix("crew-") {
                    Some(name) if !name.is_empty() => AgentAddress::Crew {
                        rig: rig.to_string(),
                        name: name.to_string(),
                    },
                    Some(_) => continue,
                    None if !tail.is_empty() => AgentAddress::Polecat {
                        rig: rig.to_string(),
                        name: tail.to_string(),
                    },
                    None => continue,
                },
            };
            return Some(addr);
        }
        None
    }
}

impl fmt::Display for AgentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentAddress::Mayor => write!(f, "mayor"),
            AgentAddress::Deacon => write!(f, "deacon"),
            AgentAddress::Witness { rig } => write!(f, "{rig}/witness"),
            AgentAddress::Refinery { rig } => write!(f, "{rig}/refinery"),
            AgentAddress::Polecat { rig, name } => write!(f, "{rig}/{name}"),
            AgentAddress::Crew { rig, name } => write!(f, "{rig}/crew/{name}"),
        }
    }
}

impl Serialize for AgentAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AgentAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        AgentAddress::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rig routing tables.
//!
//! `routes.json` maps rig name → bead-id prefix (2–4 lowercase letters);
//! `rigs.json` is the rig registry with per-rig configuration. Both live
//! under `<town>/mayor/` and are rewritten atomically on change.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed routes file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid rig prefix {prefix:?} for rig {rig:?} (want 2-4 lowercase letters)")]
    InvalidPrefix { rig: String, prefix: String },
}

/// The town's rig → prefix table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routes {
    #[serde(default)]
    routes: BTreeMap<SmolStr, SmolStr>,
}

impl Routes {
    pub fn new() -> Routes {
        Routes::default()
    }

    /// Build a table from (rig, prefix) pairs. Test convenience.
    pub fn from_pairs<I, S>(pairs: I) -> Routes
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        Routes {
            routes: pairs
                .into_iter()
                .map(|(r, p)| (SmolStr::new(r.as_ref()), SmolStr::new(p.as_ref())))
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Routes, RoutesError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), RoutesError> {
        crate::town::write_json_atomic(path, self)?;
        Ok(())
    }

    pub fn insert(&mut self, rig: &str, prefix: &str) -> Result<(), RoutesError> {
        if prefix.len() < 2
            || prefix.len() > 4
            || !prefix.bytes().all(|b| b.is_ascii_lowercase())
        {
            return Err(RoutesError::InvalidPrefix {
                rig: rig.to_string(),
                prefix: prefix.to_string(),
            });
        }
        self.routes.insert(SmolStr::new(rig), SmolStr::new(prefix));
        Ok(())
    }

    pub fn prefix_for(&self, rig: &str) -> Option<&str> {
        self.routes.get(rig).map(|p| p.as_str())
    }

    /// Reverse lookup: which rig owns this bead-id prefix.
    pub fn rig_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|(_, p)| p.as_str() == prefix)
            .map(|(r, _)| r.as_str())
    }

    pub fn rigs(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(|r| r.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Per-rig configuration from `rigs.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigEntry {
    pub prefix: SmolStr,
    /// Long-lived crew workers configured for this rig.
    #[serde(default)]
    pub crews: Vec<String>,
    /// Name pool for ephemeral polecats.
    #[serde(default)]
    pub polecat_pool: Vec<String>,
}

/// The rig registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rigs {
    #[serde(default)]
    pub rigs: BTreeMap<SmolStr, RigEntry>,
}

impl Rigs {
    pub fn load(path: &Path) -> Result<Rigs, RoutesError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), RoutesError> {
        crate::town::write_json_atomic(path, self)?;
        Ok(())
    }

    pub fn get(&self, rig: &str) -> Option<&RigEntry> {
        self.rigs.get(rig)
    }

    /// Derive the routes table from the registry.
    pub fn to_routes(&self) -> Routes {
        Routes {
            routes: self
                .rigs
                .iter()
                .map(|(name, entry)| (name.clone(), entry.prefix.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Town root discovery and filesystem layout.
//!
//! A town is a directory carrying a `mayor/town.json` marker. Everything the
//! core persists outside the issue store lives at paths derived from the
//! town root; this module is the single place those paths are spelled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TownError {
    #[error("not inside a Gas Town workspace (no mayor/town.json found)")]
    NotInWorkspace,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed town marker: {0}")]
    Json(#[from] serde_json::Error),
}

/// Contents of `mayor/town.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TownMarker {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub public_name: String,
    pub created_at: DateTime<Utc>,
}

/// A discovered town root with path helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Town {
    root: PathBuf,
}

impl Town {
    /// Wrap a known town root without checking the marker.
    pub fn at(root: impl Into<PathBuf>) -> Town {
        Town { root: root.into() }
    }

    /// Discover the town root: `GT_ROOT` if set, otherwise walk up from
    /// `start` until a directory with `mayor/town.json` is found.
    pub fn discover(start: &Path) -> Result<Town, TownError> {
        if let Ok(root) = std::env::var("GT_ROOT") {
            if !root.is_empty() {
                let root = PathBuf::from(root);
                if root.join("mayor").join("town.json").is_file() {
                    return Ok(Town { root });
                }
                return Err(TownError::NotInWorkspace);
            }
        }
        let mut dir = start;
        loop {
            if dir.join("mayor").join("town.json").is_file() {
                return Ok(Town { root: dir.to_path_buf() });
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => return Err(TownError::NotInWorkspace),
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn marker(&self) -> Result<TownMarker, TownError> {
        let content = std::fs::read_to_string(self.town_json())?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn mayor_dir(&self) -> PathBuf {
        self.root.join("mayor")
    }

    pub fn town_json(&self) -> PathBuf {
        self.mayor_dir().join("town.json")
    }

    pub fn routes_json(&self) -> PathBuf {
        self.mayor_dir().join("routes.json")
    }

    pub fn rigs_json(&self) -> PathBuf {
        self.mayor_dir().join("rigs.json")
    }

    pub fn channels_json(&self) -> PathBuf {
        self.mayor_dir().join("channels.json")
    }

    pub fn accounts_json(&self) -> PathBuf {
        self.mayor_dir().join("accounts.json")
    }

    /// Town-scoped issue store.
    pub fn beads_dir(&self) -> PathBuf {
        self.root.join(".beads")
    }

    pub fn rig_dir(&self, rig: &str) -> PathBuf {
        self.root.join(rig)
    }

    /// Per-rig issue store.
    pub fn rig_beads_dir(&self, rig: &str) -> PathBuf {
        self.rig_dir(rig).join(".beads")
    }

    fn gastown_dir(&self) -> PathBuf {
        self.root.join(".gastown")
    }

    /// Advisory lock directory for sling and queue operations.
    pub fn locks_dir(&self) -> PathBuf {
        self.gastown_dir().join("locks")
    }

    /// Append-only dispatcher event log.
    pub fn events_file(&self) -> PathBuf {
        self.gastown_dir().join("events.jsonl")
    }

    /// Per-session nudge queue file.
    pub fn queue_file(&self, session: &str) -> PathBuf {
        self.gastown_dir()
            .join("queues")
            .join(format!("{}.queue", sanitize_filename(session)))
    }

    /// Mail unread-count cache directory (user cache dir, not the town).
    /// `GT_CACHE_DIR` overrides the location.
    pub fn mail_cache_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("GT_CACHE_DIR") {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("gastown")
    }
}

/// Replace path-hostile characters so an address or session name can be
/// used as a single filename component.
pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '-' })
        .collect()
}

/// Write a JSON value to `path` atomically (temp file + rename).
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), std::io::Error> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json.as_bytes())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "town_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scoped exclusive file lock.
//!
//! One abstraction serves every advisory lock in the town (sling per-bead
//! locks, the nudge queue). `acquire()` uses `O_CREAT | O_EXCL` so two
//! processes racing on the same path have exactly one winner; the payload
//! records the holder's pid so a crashed holder's lock can be reclaimed.
//! Failure to acquire is a first-class error, never retried silently.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock held by pid {pid}")]
    Held { pid: u32 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Payload written into the lock file.
#[derive(Debug, Serialize, Deserialize)]
struct LockPayload {
    pid: u32,
    acquired_at_ms: u64,
}

/// An exclusive lock on a filesystem path, released on drop.
#[derive(Debug)]
pub struct ScopedLock {
    path: PathBuf,
    released: bool,
}

impl ScopedLock {
    /// Try to take the lock at `path`.
    ///
    /// A lock whose holder pid is dead (or whose payload is unreadable) is
    /// treated as stale: it is removed and the acquire retried once. A live
    /// holder yields [`LockError::Held`].
    pub fn acquire(path: &Path) -> Result<ScopedLock, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        for attempt in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    let payload = LockPayload {
                        pid: std::process::id(),
                        acquired_at_ms: std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_millis() as u64,
                    };
                    let json = serde_json::to_string(&payload)
                        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                    file.write_all(json.as_bytes())?;
                    return Ok(ScopedLock { path: path.to_path_buf(), released: false });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    match read_holder(path) {
                        Some(pid) if pid_alive(pid) => return Err(LockError::Held { pid }),
                        _ if attempt == 0 => {
                            // Stale or corrupt; reclaim and retry once.
                            tracing::debug!(path = %path.display(), "removing stale lock");
                            let _ = std::fs::remove_file(path);
                        }
                        Some(pid) => return Err(LockError::Held { pid }),
                        None => return Err(LockError::Held { pid: 0 }),
                    }
                }
                Err(e) => return Err(LockError::Io(e)),
            }
        }
        Err(LockError::Held { pid: 0 })
    }

    /// Release explicitly (drop also releases).
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
            self.released = true;
        }
    }
}

impl Drop for ScopedLock {
    fn drop(&mut self) {
        self.remove();
    }
}

fn read_holder(path: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(path).ok()?;
    let payload: LockPayload = serde_json::from_str(&content).ok()?;
    Some(payload.pid)
}

/// Signal-0 probe for holder liveness.
fn pid_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;

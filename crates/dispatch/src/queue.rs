// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session nudge queues.
//!
//! Queued messages are system-reminder blocks appended to a per-session
//! file under the town root; the target drains the file from its tool-post
//! hook. Appends and drains serialise on a scoped lock next to the queue
//! file. Queued delivery is unconditional; an idle agent will not see the
//! message until it next runs a tool.

use gt_core::{ScopedLock, Town};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::DispatchError;

fn queue_lock_path(queue: &Path) -> PathBuf {
    queue.with_extension("queue.lock")
}

/// Wrap a message in the literal system-reminder tags.
pub fn system_reminder(from: &str, message: &str) -> String {
    format!("<system-reminder>\nMessage from {from}: {message}\n</system-reminder>\n")
}

/// Append one system-reminder block to a session's queue.
pub fn queue_message(
    town: &Town,
    session: &str,
    from: &str,
    message: &str,
) -> Result<(), DispatchError> {
    let path = town.queue_file(session);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _lock = acquire_queue_lock(&path)?;
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
    file.write_all(system_reminder(from, message).as_bytes())?;
    Ok(())
}

/// Take everything queued for a session, clearing the queue.
pub fn drain_queue(town: &Town, session: &str) -> Result<Option<String>, DispatchError> {
    let path = town.queue_file(session);
    let _lock = acquire_queue_lock(&path)?;
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            std::fs::remove_file(&path)?;
            if content.is_empty() {
                Ok(None)
            } else {
                Ok(Some(content))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DispatchError::Io(e)),
    }
}

fn acquire_queue_lock(queue: &Path) -> Result<ScopedLock, DispatchError> {
    ScopedLock::acquire(&queue_lock_path(queue)).map_err(|e| match e {
        gt_core::LockError::Held { .. } => DispatchError::LockContention {
            bead: queue.display().to_string(),
        },
        gt_core::LockError::Io(e) => DispatchError::Io(e),
    })
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

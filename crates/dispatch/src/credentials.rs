// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential storage behind quota rotation.
//!
//! The config dir is the identity the agent process sees: rotating an
//! account means replacing what the session's config dir *contains*, never
//! which dir the session points at. On macOS the credential blob lives in
//! the keychain keyed by config dir; elsewhere it is the dir's
//! `.credentials.json`. The `oauthAccount` field of `.claude.json` must be
//! rewritten alongside the token so the account identity matches.

use std::path::Path;

use crate::error::DispatchError;

#[cfg(target_os = "macos")]
const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";

/// Read the credential blob for a config dir.
pub fn read_credential(config_dir: &Path) -> Result<String, DispatchError> {
    #[cfg(target_os = "macos")]
    if let Some(blob) = read_keychain(config_dir) {
        return Ok(blob);
    }
    let path = config_dir.join(".credentials.json");
    Ok(std::fs::read_to_string(&path)?)
}

/// Store the credential blob for a config dir.
pub fn write_credential(config_dir: &Path, blob: &str) -> Result<(), DispatchError> {
    #[cfg(target_os = "macos")]
    {
        write_keychain(config_dir, blob)?;
    }
    std::fs::create_dir_all(config_dir)?;
    std::fs::write(config_dir.join(".credentials.json"), blob)?;
    Ok(())
}

/// Copy the `oauthAccount` field of `.claude.json` from one config dir to
/// another, leaving the rest of the target file intact.
pub fn copy_oauth_account(from_dir: &Path, to_dir: &Path) -> Result<(), DispatchError> {
    let source = std::fs::read_to_string(from_dir.join(".claude.json"))?;
    let source: serde_json::Value = serde_json::from_str(&source)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let Some(account) = source.get("oauthAccount").cloned() else {
        return Err(DispatchError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no oauthAccount in {}", from_dir.display()),
        )));
    };

    let target_path = to_dir.join(".claude.json");
    let mut target: serde_json::Value = match std::fs::read_to_string(&target_path) {
        Ok(content) => serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => serde_json::json!({}),
        Err(e) => return Err(DispatchError::Io(e)),
    };
    target["oauthAccount"] = account;
    gt_core::town::write_json_atomic(&target_path, &target)?;
    Ok(())
}

/// Read the blob from the macOS keychain, keyed by config dir.
#[cfg(target_os = "macos")]
fn read_keychain(config_dir: &Path) -> Option<String> {
    let account = config_dir.to_string_lossy();
    let output = std::process::Command::new("security")
        .args(["find-generic-password", "-s", KEYCHAIN_SERVICE, "-a", &account, "-w"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let raw = String::from_utf8(output.stdout).ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Upsert the blob into the macOS keychain (-U updates in place).
#[cfg(target_os = "macos")]
fn write_keychain(config_dir: &Path, blob: &str) -> Result<(), DispatchError> {
    let account = config_dir.to_string_lossy();
    let output = std::process::Command::new("security")
        .args([
            "add-generic-password",
            "-U",
            "-s",
            KEYCHAIN_SERVICE,
            "-a",
            &account,
            "-w",
            blob,
        ])
        .output()?;
    if !output.status.success() {
        return Err(DispatchError::Io(std::io::Error::other(format!(
            "keychain write failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ))));
    }
    Ok(())
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;

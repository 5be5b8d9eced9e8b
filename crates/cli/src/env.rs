// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables read by the CLI.

use std::path::PathBuf;
use std::time::Duration;

use crate::client::ClientError;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Resolve state directory: JW_STATE_DIR > XDG_STATE_HOME/jw > ~/.local/state/jw
pub fn state_dir() -> Result<PathBuf, ClientError> {
    if let Ok(dir) = std::env::var("JW_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("jw"));
    }
    let home = std::env::var("HOME").map_err(|_| ClientError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/jw"))
}

/// JW_STATE_DIR as set, for diagnostics
pub fn state_dir_raw() -> Option<String> {
    std::env::var("JW_STATE_DIR").ok()
}

pub fn daemon_binary() -> Option<String> {
    std::env::var("JW_DAEMON_BINARY").ok().filter(|s| !s.is_empty())
}

pub fn cargo_manifest_dir() -> Option<String> {
    std::env::var("CARGO_MANIFEST_DIR").ok()
}

pub fn timeout_ipc_ms() -> Option<Duration> {
    parse_duration_ms("JW_TIMEOUT_IPC_MS")
}
pub fn timeout_connect_ms() -> Option<Duration> {
    parse_duration_ms("JW_TIMEOUT_CONNECT_MS")
}
pub fn timeout_exit_ms() -> Option<Duration> {
    parse_duration_ms("JW_TIMEOUT_EXIT_MS")
}
pub fn connect_poll_ms() -> Option<Duration> {
    parse_duration_ms("JW_CONNECT_POLL_MS")
}

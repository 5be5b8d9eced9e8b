// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: JW_STATE_DIR > XDG_STATE_HOME/jw > ~/.local/state/jw
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("JW_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("jw"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/jw"))
}

fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Stop grace period override
pub fn stop_grace_ms() -> Option<Duration> {
    duration_ms("JW_STOP_GRACE_MS")
}

/// Capture drain timeout override
pub fn drain_timeout_ms() -> Option<Duration> {
    duration_ms("JW_DRAIN_TIMEOUT_MS")
}

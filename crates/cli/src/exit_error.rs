// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors that carry a specific process exit code.

use jw_core::{JobInfo, JobStatus};
use jw_daemon::ErrorKind;

use crate::client::ClientError;

/// No job with the given id
pub const EXIT_NOT_FOUND: i32 = 3;
/// Job already finished or stopped
pub const EXIT_NOT_RUNNING: i32 = 4;

/// Error that exits the CLI with `code`.
///
/// An empty message exits quietly.
#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn silent(code: i32) -> Self {
        Self::new(code, "")
    }

    /// Exit code mirroring how a waited-on job ended, or `None` on success.
    ///
    /// Failed jobs pass their own code through; signal deaths use the
    /// shell convention of 128 + signal.
    pub fn for_job(info: &JobInfo) -> Option<Self> {
        let code = match info.status {
            JobStatus::Running | JobStatus::Completed => return None,
            JobStatus::Failed | JobStatus::Terminated => match (info.exit_code, info.signal) {
                (Some(code), _) if (1..=255).contains(&code) => code,
                (_, Some(signal)) => 128 + signal,
                _ => 1,
            },
        };
        Some(Self::silent(code))
    }
}

impl std::fmt::Display for ExitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExitError {}

/// Map client errors onto the CLI's exit codes.
///
/// `not_found` and `not_running` rejections get their own codes; anything
/// else stays a plain error (exit 1).
pub fn client_error(err: ClientError) -> anyhow::Error {
    match err.rejected_kind() {
        Some(ErrorKind::NotFound) => ExitError::new(EXIT_NOT_FOUND, err.to_string()).into(),
        Some(ErrorKind::NotRunning) => ExitError::new(EXIT_NOT_RUNNING, err.to_string()).into(),
        _ => err.into(),
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;

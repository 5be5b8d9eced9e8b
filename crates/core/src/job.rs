// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, status state machine, and query snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

crate::define_id! {
    /// Opaque identifier for a supervised job.
    ///
    /// Issued by the registry when the job starts; never reused while the
    /// daemon is running.
    pub struct JobId;
}

/// Lifecycle status of a job.
///
/// A job starts `Running` and moves exactly once to one of the three
/// terminal states. Use [`JobStatus::transition`] to change it; nothing else
/// decides which edges are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Process spawned and not yet finalized
    #[default]
    Running,
    /// Process exited with status 0
    Completed,
    /// Process exited non-zero or was killed by a signal it was not asked to take
    Failed,
    /// Stopped on request
    Terminated,
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal job status transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }

    /// Validate a change from `self` to `to`, returning the new status.
    pub fn transition(self, to: JobStatus) -> Result<JobStatus, TransitionError> {
        match (self, to) {
            (JobStatus::Running, JobStatus::Completed)
            | (JobStatus::Running, JobStatus::Failed)
            | (JobStatus::Running, JobStatus::Terminated) => Ok(to),
            _ => Err(TransitionError { from: self, to }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Terminated => "terminated",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "terminated" => Ok(JobStatus::Terminated),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Point-in-time view of a job, as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: JobId,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at_ms: Option<u64>,
    /// Exit code, when the process exited normally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Terminating signal, when the process was killed by one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    /// Number of captured output lines so far
    #[serde(default)]
    pub lines: usize,
}

impl JobInfo {
    /// Command line as typed, for display.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// Milliseconds since the Unix epoch.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

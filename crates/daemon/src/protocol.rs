// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol for daemon communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

use std::collections::HashMap;
use std::path::PathBuf;

use jw_core::{JobId, JobInfo, JobStatus};
use serde::{Deserialize, Serialize};

#[path = "protocol_wire.rs"]
mod wire;
pub use wire::{
    decode, encode, read_message, read_request, read_response, write_message, write_request,
    write_response, ProtocolError, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Get daemon status
    Status,

    /// Request daemon shutdown
    Shutdown {
        /// Stop all running jobs before exiting
        #[serde(default)]
        kill: bool,
    },

    /// Start a command as a new job
    Start {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        /// Working directory; defaults to the daemon's
        #[serde(default)]
        cwd: Option<PathBuf>,
        /// Extra environment, added to the daemon's own
        #[serde(default)]
        env: HashMap<String, String>,
    },

    /// Interrupt a running job
    Stop { id: String },

    /// Current status and details of one job
    QueryStatus { id: String },

    /// Everything the job has printed so far
    GetOutput { id: String },

    /// Stream the job's output from the first line until it ends.
    ///
    /// The daemon answers with any number of [`Response::Line`] followed by
    /// [`Response::EndOfStream`] on the same connection.
    SubscribeOutput { id: String },

    /// Every job the daemon knows about
    ListJobs,
}

impl Request {
    /// Whether the request changes daemon or job state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Request::Start { .. } | Request::Stop { .. } | Request::Shutdown { .. }
        )
    }
}

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon status
    Status {
        uptime_secs: u64,
        jobs_total: usize,
        jobs_running: usize,
    },

    /// Daemon is shutting down
    ShuttingDown,

    /// Job was started
    Started { id: JobId },

    /// Job was interrupted
    Stopped { id: JobId },

    /// Single job details
    Job { job: Box<JobInfo> },

    /// Captured output of a job
    Output { id: JobId, output: String },

    /// List of jobs
    Jobs { jobs: Vec<JobInfo> },

    /// One streamed output line
    Line { line: String },

    /// Output stream finished; the job is in its final state
    EndOfStream { status: JobStatus },

    /// Request failed
    Error { kind: ErrorKind, message: String },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error {
            kind,
            message: message.into(),
        }
    }
}

/// Machine-readable class of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No job with that id
    NotFound,
    /// Job already finished or was stopped
    NotRunning,
    /// Command could not be started
    Spawn,
    /// Stop signal could not be delivered
    Signal,
    /// Caller lacks the role for this request
    Forbidden,
    /// Malformed or unsupported request
    Invalid,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::NotRunning => "not_running",
            ErrorKind::Spawn => "spawn",
            ErrorKind::Signal => "signal",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;

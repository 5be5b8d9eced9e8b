// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for job supervision

use jw_core::JobId;
use thiserror::Error;

/// Errors returned by [`Job`](crate::Job) and [`JobRegistry`](crate::JobRegistry)
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("job id already in use: {0}")]
    DuplicateId(JobId),
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job {0} is not running or has already completed")]
    NotRunning(JobId),
    #[error("failed to signal job {id}: {source}")]
    Signal {
        id: JobId,
        #[source]
        source: std::io::Error,
    },
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource-isolation hook applied to every job before it is spawned.
//!
//! The engine calls [`SandboxPolicy::apply`] on the fully built command
//! right before `spawn`. Policies may add limits, change credentials, or
//! refuse the command outright by returning an error, which surfaces as
//! [`EngineError::Spawn`](crate::EngineError::Spawn).

use std::fmt;
use std::io;
use tokio::process::Command;

pub trait SandboxPolicy: Send + Sync + fmt::Debug {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn apply(&self, cmd: &mut Command) -> io::Result<()>;
}

/// Runs jobs with the daemon's own privileges and limits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSandbox;

impl SandboxPolicy for NoSandbox {
    fn name(&self) -> &'static str {
        "none"
    }

    fn apply(&self, _cmd: &mut Command) -> io::Result<()> {
        Ok(())
    }
}

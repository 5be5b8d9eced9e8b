// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Job Worker supervision engine
//!
//! Spawns child processes, captures their output into an [`OutputLog`],
//! tracks their lifecycle, and stops them on request.
//!
//! [`OutputLog`]: jw_core::OutputLog

mod capture;
mod error;
mod job;
mod monitor;
mod registry;
pub mod sandbox;
mod signal;

pub use error::EngineError;
pub use job::{Job, JobOptions, JobSpec};
pub use registry::JobRegistry;
pub use sandbox::{NoSandbox, SandboxPolicy};

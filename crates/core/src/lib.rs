// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jw-core: job identity, status state machine, and the shared output log

pub mod id;
pub mod job;
pub mod log;
pub mod time_fmt;

pub use id::{IdGen, SequentialIdGen, ShortId, UuidIdGen};
pub use job::{epoch_ms, JobId, JobInfo, JobStatus, TransitionError};
pub use log::{LogCursor, OutputLog};
pub use time_fmt::{format_ago, format_duration_ms};

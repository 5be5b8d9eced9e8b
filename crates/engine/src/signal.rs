// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-group signalling.

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io;

pub(crate) use nix::sys::signal::Signal::{SIGINT, SIGKILL};

/// Send `signal` to the process group led by `pid`.
///
/// Jobs are spawned as group leaders, so this reaches the job's own
/// children as well.
pub(crate) fn signal_group(pid: u32, signal: Signal) -> io::Result<()> {
    let raw = i32::try_from(pid).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    killpg(Pid::from_raw(raw), signal).map_err(io::Error::from)
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locating, spawning, and signalling the `jwd` process.

use crate::client::{poll_interval, timeout_exit, ClientError};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Start the daemon in the background, returning the child process handle
pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let jwd_path = find_jwd_binary()?;

    Command::new(&jwd_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {}", jwd_path.display(), e)))
}

/// Stop the daemon with SIGTERM, escalating to SIGKILL.
///
/// Blocking; used from the synchronous connect path.
pub fn stop_daemon_sync() {
    if let Ok(Some(pid)) = read_daemon_pid() {
        send_signal(pid, Some(Signal::SIGTERM));
        if !wait_for_exit_sync(pid, timeout_exit()) {
            force_kill_daemon(pid);
            wait_for_exit_sync(pid, timeout_exit());
        }
    }

    if let Ok(dir) = daemon_dir() {
        cleanup_stale_pid(&dir);
    }
}

fn wait_for_exit_sync(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    !process_exists(pid)
}

/// Wait for a process to exit
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(poll_interval()).await;
    }
    false
}

/// Find the jwd binary: JW_DAEMON_BINARY, the dev build, a sibling, then PATH
pub fn find_jwd_binary() -> Result<PathBuf, ClientError> {
    if let Some(path) = crate::env::daemon_binary() {
        return Ok(PathBuf::from(path));
    }

    let current_exe = std::env::current_exe().ok();

    // A release CLI must not pick up a stale debug daemon
    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .is_some_and(|s| s.contains("target/debug"));

    if is_debug_build {
        let dev_path = crate::env::cargo_manifest_dir().and_then(|dir| {
            PathBuf::from(dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.join("target/debug/jwd"))
        });
        if let Some(path) = dev_path.filter(|p| p.exists()) {
            return Ok(path);
        }
    }

    if let Some(dir) = current_exe.as_ref().and_then(|exe| exe.parent()) {
        let sibling = dir.join("jwd");
        if sibling.exists() {
            return Ok(sibling);
        }
    }

    Ok(PathBuf::from("jwd"))
}

pub fn daemon_socket() -> Result<PathBuf, ClientError> {
    Ok(daemon_dir()?.join("daemon.sock"))
}

pub fn daemon_dir() -> Result<PathBuf, ClientError> {
    crate::env::state_dir()
}

pub fn daemon_log_path() -> Result<PathBuf, ClientError> {
    Ok(daemon_dir()?.join("daemon.log"))
}

/// Remove a leftover PID file.
pub fn cleanup_stale_pid(dir: &Path) {
    let pid_path = dir.join("daemon.pid");
    if pid_path.exists() {
        let _ = std::fs::remove_file(&pid_path);
    }
}

/// PID recorded by the running daemon, if any
pub fn read_daemon_pid() -> Result<Option<u32>, ClientError> {
    let pid_path = daemon_dir()?.join("daemon.pid");
    match std::fs::read_to_string(&pid_path) {
        Ok(content) => Ok(content.trim().parse::<u32>().ok()),
        Err(_) => Ok(None),
    }
}

/// Deliver `signal` to `pid`; `None` only checks that the process exists.
fn send_signal(pid: u32, signal: Option<Signal>) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    kill(Pid::from_raw(raw), signal).is_ok()
}

pub fn process_exists(pid: u32) -> bool {
    send_signal(pid, None)
}

pub fn force_kill_daemon(pid: u32) -> bool {
    send_signal(pid, Some(Signal::SIGKILL))
}

/// Line the daemon writes to its log before anything else.
const STARTUP_MARKER_PREFIX: &str = "--- jwd: starting (pid: ";

/// Errors logged since the daemon's most recent startup marker.
pub fn read_startup_error() -> Option<String> {
    let content = std::fs::read_to_string(daemon_log_path().ok()?).ok()?;
    parse_startup_error(&content)
}

fn parse_startup_error(content: &str) -> Option<String> {
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;

    let errors: Vec<&str> = content[start_pos..]
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();
    if errors.is_empty() {
        return None;
    }

    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg))
        .collect();
    if messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(messages.join("\n"))
    }
}

/// Replace `err` with the daemon's own startup error, when it logged one.
pub fn wrap_with_startup_error(err: ClientError) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }
    match read_startup_error() {
        Some(startup_error) => ClientError::DaemonStartFailed(startup_error),
        None => err,
    }
}

/// Whether a Unix socket accepts connections.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

/// Remove a socket left by a daemon that is no longer running.
///
/// Leaves everything in place if the PID file names a live process.
pub fn cleanup_stale_socket() -> Result<(), ClientError> {
    let dir = daemon_dir()?;
    let socket_path = dir.join("daemon.sock");
    let pid_path = dir.join("daemon.pid");

    let alive = matches!(read_daemon_pid()?, Some(pid) if process_exists(pid));
    if !alive {
        let _ = std::fs::remove_file(&socket_path);
        let _ = std::fs::remove_file(&pid_path);
    }
    Ok(())
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;

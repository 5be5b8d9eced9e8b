// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use jw_daemon::PROTOCOL_VERSION;
use jw_engine::JobRegistry;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::settings::Settings;

/// Daemon file layout under the state directory
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/jw)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the optional settings file
    pub settings_path: PathBuf,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// One daemon serves every client of a user.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::for_state_dir(crate::env::state_dir()?))
    }

    pub fn for_state_dir(state_dir: PathBuf) -> Self {
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            settings_path: state_dir.join("config.toml"),
            state_dir,
        }
    }
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Every job started by this daemon
    pub registry: Arc<JobRegistry>,
    /// When daemon started
    pub start_time: Instant,
}

/// Result of daemon startup: the daemon state plus the bound socket.
pub struct StartupResult {
    pub daemon: DaemonState,
    /// The Unix socket listener to spawn as a task
    pub listener: UnixListener,
}

impl DaemonState {
    /// Remove the socket, pid and version files.
    ///
    /// Running jobs are left alone here; `Shutdown { kill: true }` stops them
    /// in the listener before the shutdown signal fires.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!(
            jobs = self.registry.len(),
            running = self.registry.running_count(),
            "Shutting down daemon..."
        );

        for path in [
            &self.config.socket_path,
            &self.config.lock_path,
            &self.config.version_path,
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "failed to remove daemon file");
                }
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Invalid config file {0}: {1}")]
    Config(PathBuf, toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config, settings: &Settings) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config, settings).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock;
            // those files belong to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config, settings: &Settings) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST. Open without truncating so a running
    // daemon's pid survives a losing attempt.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Write version file
    std::fs::write(&config.version_path, PROTOCOL_VERSION)?;

    let registry = Arc::new(JobRegistry::new(settings.job_options()));

    // 4. Remove stale socket and bind (LAST, only after everything else passed)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(
        stop_grace_ms = settings.jobs.stop_grace_ms,
        drain_timeout_ms = settings.jobs.drain_timeout_ms,
        admin_uids = ?settings.auth.admin_uids,
        "Daemon started"
    );

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            registry,
            start_time: Instant::now(),
        },
        listener,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    for path in [&config.socket_path, &config.version_path, &config.lock_path] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

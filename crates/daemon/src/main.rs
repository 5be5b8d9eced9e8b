// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Worker Daemon (jwd)
//!
//! Background process that owns every job a user starts.
//!
//! Architecture:
//! - Listener Task: accepts socket connections, one task per client
//! - Job tasks: per-job capture and monitor tasks inside the engine
//! - Main task: waits for a shutdown request or signal, then cleans up

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod auth;
mod env;
mod lifecycle;
mod listener;
mod settings;

use std::path::Path;
use std::sync::Arc;

use jw_daemon::PROTOCOL_VERSION;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use crate::auth::AuthPolicy;
use crate::lifecycle::{Config, LifecycleError, StartupResult};
use crate::listener::{ListenCtx, Listener};
use crate::settings::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("jwd {}", PROTOCOL_VERSION);
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("jwd {}", PROTOCOL_VERSION);
                println!("Job Worker Daemon - runs and supervises jobs started with `jw`");
                println!();
                println!("USAGE:");
                println!("    jwd");
                println!();
                println!("The daemon is typically started by the `jw` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for commands");
                println!("from `jw`.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: jwd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    // Write startup marker to log (before tracing setup, so CLI can find it)
    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!("Starting user-level daemon");

    let settings = match Settings::load(&config.settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            write_startup_error(&config, &e);
            error!("Failed to load settings: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let StartupResult {
        mut daemon,
        listener: unix_listener,
    } = match lifecycle::startup(&config, &settings).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            // Another daemon is already running
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            let version = std::fs::read_to_string(&config.version_path)
                .unwrap_or_default()
                .trim()
                .to_string();

            eprintln!("jwd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            if !version.is_empty() {
                if version == PROTOCOL_VERSION {
                    eprintln!("  version: {version}");
                } else {
                    eprintln!("  version: {version} (outdated, current: {PROTOCOL_VERSION})");
                }
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let shutdown_notify = Arc::new(Notify::new());
    let daemon_uid = nix::unistd::getuid().as_raw();

    let ctx = Arc::new(ListenCtx {
        registry: Arc::clone(&daemon.registry),
        auth: AuthPolicy::from_settings(daemon_uid, &settings.auth),
        start_time: daemon.start_time,
        shutdown: Arc::clone(&shutdown_notify),
    });
    tokio::spawn(Listener::new(unix_listener, ctx).run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "Daemon ready, listening on {}",
        config.socket_path.display()
    );

    // Signal ready for parent process (CLI waiting for startup)
    println!("READY");

    tokio::select! {
        _ = shutdown_notify.notified() => info!("Shutdown requested via command"),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    daemon.shutdown()?;
    info!("Daemon stopped");
    Ok(())
}

/// Startup marker prefix written to log before anything else.
/// CLI uses this to find where the current startup attempt begins.
/// Full format: "--- jwd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- jwd: starting (pid: ";

/// Rotate `daemon.log` once it passes this size
pub const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotated copies kept (`daemon.log.1` ..= `daemon.log.N`)
const MAX_ROTATIONS: u32 = 3;

/// Shift `log` to `log.1` (and older copies up by one) if it is too large.
fn rotate_log_if_needed(log: &Path) {
    let Ok(meta) = std::fs::metadata(log) else {
        return;
    };
    if meta.len() <= MAX_LOG_SIZE {
        return;
    }

    let rotated = |n: u32| {
        let mut name = log.as_os_str().to_owned();
        name.push(format!(".{n}"));
        std::path::PathBuf::from(name)
    };
    for n in (1..MAX_ROTATIONS).rev() {
        let from = rotated(n);
        if from.exists() {
            let _ = std::fs::rename(&from, rotated(n + 1));
        }
    }
    let _ = std::fs::rename(log, rotated(1));
}

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
/// This ensures the error is visible to the CLI even if the process exits quickly.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

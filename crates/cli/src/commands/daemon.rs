// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `jw daemon` - Daemon management commands

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::process::Command;

use crate::client::{DaemonClient, DaemonStatus};
use crate::client_lifecycle::daemon_stop;
use crate::daemon_process::{daemon_log_path, find_jwd_binary};
use crate::output::{display_log, print_json, read_last_lines, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon
    Start {
        /// Run in the foreground instead of detaching
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop {
        /// Stop every running job before exiting
        #[arg(long)]
        kill: bool,
    },
    /// Show daemon status
    Status,
    /// Stop and start the daemon
    Restart {
        /// Stop every running job before exiting
        #[arg(long)]
        kill: bool,
    },
    /// Show the daemon log
    Logs {
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Show the whole log
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
        /// Keep printing new lines
        #[arg(long, short)]
        follow: bool,
    },
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        DaemonCommand::Start { foreground } => start(foreground).await,
        DaemonCommand::Stop { kill } => stop(kill).await,
        DaemonCommand::Restart { kill } => restart(kill).await,
        DaemonCommand::Status => status(format).await,
        DaemonCommand::Logs {
            limit,
            no_limit,
            follow,
        } => logs(limit, no_limit, follow, format).await,
    }
}

async fn start(foreground: bool) -> Result<()> {
    if foreground {
        let jwd_path = find_jwd_binary()?;
        let status = Command::new(&jwd_path).status()?;
        if !status.success() {
            return Err(anyhow!("Daemon exited with status: {}", status));
        }
        return Ok(());
    }

    if let Ok(client) = DaemonClient::connect() {
        if let Ok(status) = client.status().await {
            println!(
                "Daemon already running (uptime: {})",
                format_uptime(status.uptime_secs)
            );
            return Ok(());
        }
    }

    DaemonClient::connect_or_start()?;
    println!("Daemon started");
    Ok(())
}

async fn stop(kill: bool) -> Result<()> {
    match daemon_stop(kill).await {
        Ok(true) => println!("Daemon stopped"),
        Ok(false) => println!("Daemon not running"),
        Err(e) => return Err(anyhow!("Failed to stop daemon: {}", e)),
    }
    Ok(())
}

async fn restart(kill: bool) -> Result<()> {
    let was_running = daemon_stop(kill)
        .await
        .map_err(|e| anyhow!("Failed to stop daemon: {}", e))?;

    if was_running {
        // Let the old process release the socket
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }

    DaemonClient::connect_or_start()?;
    println!("Daemon restarted");
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatusReport {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uptime_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    jobs_total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    jobs_running: Option<usize>,
}

impl StatusReport {
    fn not_running() -> Self {
        Self {
            status: "not_running",
            version: None,
            uptime_secs: None,
            jobs_total: None,
            jobs_running: None,
        }
    }

    fn running(version: String, status: DaemonStatus) -> Self {
        Self {
            status: "running",
            version: Some(version),
            uptime_secs: Some(status.uptime_secs),
            jobs_total: Some(status.jobs_total),
            jobs_running: Some(status.jobs_running),
        }
    }

    fn text(&self) -> String {
        let (Some(version), Some(uptime), Some(total), Some(running)) = (
            &self.version,
            self.uptime_secs,
            self.jobs_total,
            self.jobs_running,
        ) else {
            return "Daemon not running\n".to_string();
        };
        format!(
            "Status: running\nVersion: {}\nUptime: {}\nJobs: {} running, {} total\n",
            version,
            format_uptime(uptime),
            running,
            total
        )
    }
}

async fn status(format: OutputFormat) -> Result<()> {
    let report = match DaemonClient::connect() {
        Err(_) => StatusReport::not_running(),
        Ok(client) => match client.status().await {
            Ok(status) => {
                let version = client
                    .hello()
                    .await
                    .unwrap_or_else(|_| "unknown".to_string());
                StatusReport::running(version, status)
            }
            Err(e) if e.is_not_running() => StatusReport::not_running(),
            Err(e) => return Err(e.into()),
        },
    };

    match format {
        OutputFormat::Text => print!("{}", report.text()),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

async fn logs(limit: usize, no_limit: bool, follow: bool, format: OutputFormat) -> Result<()> {
    let log_path = daemon_log_path()?;

    if !log_path.exists() {
        match format {
            OutputFormat::Text => println!("No log file found at {}", log_path.display()),
            OutputFormat::Json => print_json(&serde_json::json!({
                "log_path": log_path.to_string_lossy(),
                "lines": [],
            }))?,
        }
        return Ok(());
    }

    let content = if no_limit {
        std::fs::read_to_string(&log_path)?
    } else {
        read_last_lines(&log_path, limit)?
    };
    display_log(&log_path, &content, follow, format).await
}

/// Uptime in whole seconds, e.g. `"1h 2m 5s"`.
fn format_uptime(secs: u64) -> String {
    let (hours, mins, secs) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (hours, mins) {
        (0, 0) => format!("{secs}s"),
        (0, _) => format!("{mins}m {secs}s"),
        _ => format!("{hours}h {mins}m {secs}s"),
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `jw start|stop|status|log|list` - job commands

use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use clap::Args;
use jw_core::{format_duration_ms, JobInfo, JobStatus};

use crate::client::{DaemonClient, StreamEvent};
use crate::exit_error::{client_error, ExitError};
use crate::output::{format_time_ago, print_json, print_output, OutputFormat};
use crate::table::{Column, Table};

/// Shell convention for "interrupted by Ctrl-C"
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Args)]
pub struct StartArgs {
    /// Follow the job's output and exit with its status
    #[arg(long, short)]
    pub wait: bool,

    /// Extra environment variable for the job (repeatable)
    #[arg(long = "env", short = 'e', value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Command to run, followed by its arguments
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

#[derive(Args)]
pub struct LogArgs {
    /// Job ID
    pub id: String,

    /// Keep streaming until the job ends (Ctrl-C to detach)
    #[arg(long, short)]
    pub follow: bool,
}

pub fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

pub async fn start(args: StartArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let Some((command, rest)) = args.command.split_first() else {
        anyhow::bail!("no command given");
    };
    let cwd = std::env::current_dir().ok();
    let env: HashMap<String, String> = args.env.into_iter().collect();

    let id = client
        .start_job(command, rest, cwd, env)
        .await
        .map_err(client_error)?;

    if !args.wait {
        match format {
            OutputFormat::Text => println!("Started job {}", id),
            OutputFormat::Json => print_json(&serde_json::json!({ "id": id }))?,
        }
        return Ok(());
    }

    if format == OutputFormat::Text {
        println!("Started job {}", id);
    }
    let end = match format {
        OutputFormat::Text => follow(client, id.as_str()).await?,
        // Output is part of the final document instead
        OutputFormat::Json => wait_quietly(client, id.as_str()).await?,
    };
    if end.is_none() {
        eprintln!("Detached; job {} is still running", id);
        return Err(ExitError::silent(EXIT_INTERRUPTED).into());
    }

    let info = client.job_status(id.as_str()).await.map_err(client_error)?;
    if format == OutputFormat::Json {
        let output = client.job_output(id.as_str()).await.map_err(client_error)?;
        print_json(&serde_json::json!({ "job": info, "output": output }))?;
    }
    match ExitError::for_job(&info) {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

pub async fn stop(id: &str, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let id = client.stop_job(id).await.map_err(client_error)?;
    match format {
        OutputFormat::Text => println!("Stopped job {}", id),
        OutputFormat::Json => print_json(&serde_json::json!({ "id": id }))?,
    }
    Ok(())
}

pub async fn status(id: &str, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let info = client.job_status(id).await.map_err(client_error)?;
    match format {
        OutputFormat::Text => print!("{}", format_job_details(&info, jw_core::epoch_ms())),
        OutputFormat::Json => print_json(&info)?,
    }
    Ok(())
}

pub async fn log(args: LogArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text if args.follow => {
            follow(client, &args.id).await?;
        }
        OutputFormat::Text => {
            let output = client.job_output(&args.id).await.map_err(client_error)?;
            print_output(&output);
        }
        OutputFormat::Json => {
            if args.follow {
                eprintln!("warning: --follow is not supported with --output json");
            }
            let output = client.job_output(&args.id).await.map_err(client_error)?;
            print_json(&serde_json::json!({ "id": args.id, "output": output }))?;
        }
    }
    Ok(())
}

pub async fn list(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let jobs = client.list_jobs().await.map_err(client_error)?;
    match format {
        OutputFormat::Text => {
            if jobs.is_empty() {
                println!("No jobs");
                return Ok(());
            }
            let mut out = std::io::stdout();
            jobs_table(&jobs).render(&mut out)?;
        }
        OutputFormat::Json => print_json(&jobs)?,
    }
    Ok(())
}

/// Print the job's output from the first line as it arrives.
///
/// Returns the final status, or `None` if the user pressed Ctrl-C first.
async fn follow(client: &DaemonClient, id: &str) -> Result<Option<JobStatus>> {
    let mut stream = client.subscribe_output(id).await.map_err(client_error)?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut at_line_start = true;
    loop {
        tokio::select! {
            event = stream.next() => match event.map_err(client_error)? {
                StreamEvent::Line(line) => {
                    at_line_start = line.ends_with('\n');
                    print!("{}", line);
                    std::io::stdout().flush()?;
                }
                StreamEvent::End(status) => {
                    if !at_line_start {
                        println!();
                    }
                    return Ok(Some(status));
                }
            },
            _ = &mut ctrl_c => return Ok(None),
        }
    }
}

/// Wait for the job to end without printing its lines.
async fn wait_quietly(client: &DaemonClient, id: &str) -> Result<Option<JobStatus>> {
    let mut stream = client.subscribe_output(id).await.map_err(client_error)?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = stream.next() => {
                if let StreamEvent::End(status) = event.map_err(client_error)? {
                    return Ok(Some(status));
                }
            }
            _ = &mut ctrl_c => return Ok(None),
        }
    }
}

/// `jw status` text view.
pub fn format_job_details(info: &JobInfo, now_ms: u64) -> String {
    let mut out = format!("Job {}: {}\n", info.id, info.status);
    out.push_str(&format!("  Command: {}\n", info.command_line()));
    if let Some(pid) = info.pid {
        out.push_str(&format!("  PID: {}\n", pid));
    }
    out.push_str(&format!(
        "  Started: {} ago\n",
        jw_core::format_ago(info.started_at_ms, now_ms)
    ));
    let end = info.finished_at_ms.unwrap_or(now_ms);
    out.push_str(&format!(
        "  Runtime: {}\n",
        format_duration_ms(end.saturating_sub(info.started_at_ms))
    ));
    if let Some(code) = info.exit_code {
        out.push_str(&format!("  Exit code: {}\n", code));
    }
    if let Some(signal) = info.signal {
        out.push_str(&format!("  Signal: {}\n", signal));
    }
    out.push_str(&format!("  Output: {} line(s)\n", info.lines));
    out
}

/// `jw list` table.
pub fn jobs_table(jobs: &[JobInfo]) -> Table {
    let mut table = Table::new(vec![
        Column::left("ID"),
        Column::left("STATUS"),
        Column::right("PID"),
        Column::left("AGE"),
        Column::right("LINES"),
        Column::left("COMMAND").with_max(48),
    ]);
    for job in jobs {
        table.row(vec![
            job.id.to_string(),
            job.status.to_string(),
            job.pid.map_or_else(|| "-".to_string(), |p| p.to_string()),
            format_time_ago(job.started_at_ms),
            job.lines.to_string(),
            job.command_line(),
        ]);
    }
    table
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

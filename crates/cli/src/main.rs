// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jw - Job Worker CLI

mod client;
mod client_lifecycle;
mod commands;
mod daemon_process;
mod env;
mod exit_error;
mod output;
mod table;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use crate::client::DaemonClient;
use crate::commands::{daemon, job};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "jw", version, about = "Job Worker - run and watch commands remotely")]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a command as a job
    Start(job::StartArgs),
    /// Interrupt a running job
    Stop {
        /// Job ID
        id: String,
    },
    /// Show a job's status
    Status {
        /// Job ID
        id: String,
    },
    /// Print a job's output
    Log(job::LogArgs),
    /// List every job the daemon knows about
    List,
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

fn cli_command() -> clap::Command {
    Cli::command()
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

/// Render an error and its causes, skipping causes the top line already shows.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let Some(command) = cli.command else {
        cli_command().print_help()?;
        println!();
        return Ok(());
    };

    // Only `start` may spawn a daemon; the rest need one that already has jobs
    match command {
        Commands::Daemon(args) => daemon::daemon(args, format).await?,
        Commands::Start(args) => {
            let client = DaemonClient::for_action()?;
            job::start(args, &client, format).await?
        }
        Commands::Stop { id } => {
            let client = DaemonClient::for_query()?;
            job::stop(&id, &client, format).await?
        }
        Commands::Status { id } => {
            let client = DaemonClient::for_query()?;
            job::status(&id, &client, format).await?
        }
        Commands::Log(args) => {
            let client = DaemonClient::for_query()?;
            job::log(args, &client, format).await?
        }
        Commands::List => {
            let client = DaemonClient::for_query()?;
            job::list(&client, format).await?
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

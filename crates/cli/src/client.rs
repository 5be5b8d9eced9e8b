// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::client_lifecycle::log_connection_error;
use crate::daemon_process::{
    cleanup_stale_socket, daemon_dir, daemon_socket, probe_socket, read_startup_error,
    start_daemon_background, stop_daemon_sync, wrap_with_startup_error,
};

use jw_core::{JobId, JobInfo, JobStatus};
use jw_daemon::protocol::{self, ErrorKind, ProtocolError};
use jw_daemon::{Request, Response, PROTOCOL_VERSION};
use thiserror::Error;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

/// Timeout for request/response exchanges
pub fn timeout_ipc() -> Duration {
    crate::env::timeout_ipc_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon to start
pub fn timeout_connect() -> Duration {
    crate::env::timeout_connect_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for a process to exit
pub fn timeout_exit() -> Duration {
    crate::env::timeout_exit_ms().unwrap_or(Duration::from_secs(2))
}

/// Polling interval for connection retries
pub fn poll_interval() -> Duration {
    crate::env::connect_poll_ms().unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The daemon answered with an error response
    #[error("{message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,
}

impl ClientError {
    /// Error kind reported by the daemon, if it rejected the request
    pub fn rejected_kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Rejected { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether the error means no daemon is listening
    pub fn is_not_running(&self) -> bool {
        match self {
            ClientError::DaemonNotRunning => true,
            ClientError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
            ),
            _ => false,
        }
    }
}

/// Turn a response that did not match the request into an error.
fn unexpected(response: Response) -> ClientError {
    match response {
        Response::Error { kind, message } => ClientError::Rejected { kind, message },
        _ => ClientError::UnexpectedResponse,
    }
}

/// Read one response with no deadline.
async fn read_frame(reader: &mut OwnedReadHalf) -> Result<Response, ClientError> {
    let bytes = protocol::read_message(reader).await?;
    Ok(protocol::decode(&bytes)?)
}

/// Daemon status as reported by `Status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub jobs_total: usize,
    pub jobs_running: usize,
}

/// Event read from an output subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Line(String),
    End(JobStatus),
}

/// Open `SubscribeOutput` connection.
///
/// Dropping it closes the connection, which cancels the daemon's read.
pub struct OutputStream {
    reader: OwnedReadHalf,
    _writer: OwnedWriteHalf,
    /// Frame already read while opening the subscription
    pending: Option<Response>,
    ended: bool,
}

impl OutputStream {
    /// Next streamed line, or the final status once the job is done.
    ///
    /// Waits without a timeout; a quiet job may not print for a long time.
    pub async fn next(&mut self) -> Result<StreamEvent, ClientError> {
        if self.ended {
            return Err(ClientError::UnexpectedResponse);
        }
        let response = match self.pending.take() {
            Some(response) => response,
            None => read_frame(&mut self.reader).await?,
        };
        match response {
            Response::Line { line } => Ok(StreamEvent::Line(line)),
            Response::EndOfStream { status } => {
                self.ended = true;
                Ok(StreamEvent::End(status))
            }
            other => Err(unexpected(other)),
        }
    }
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For action commands - auto-start with version check, max 1 restart per process
    pub fn for_action() -> Result<Self, ClientError> {
        Self::connect_or_start_once()
    }

    /// For query commands - connect only, no restart
    pub fn for_query() -> Result<Self, ClientError> {
        Self::connect()
    }

    fn connect_or_start_once() -> Result<Self, ClientError> {
        static RESTARTED: AtomicBool = AtomicBool::new(false);

        if RESTARTED.load(Ordering::SeqCst) {
            return Self::connect();
        }
        if restart_if_stale_version() {
            RESTARTED.store(true, Ordering::SeqCst);
        }
        Self::connect_or_spawn()
    }

    /// Connect to daemon, auto-starting if not running
    pub fn connect_or_start() -> Result<Self, ClientError> {
        restart_if_stale_version();
        Self::connect_or_spawn()
    }

    fn connect_or_spawn() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => {
                // The socket file can outlive a crashed daemon
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket()?;
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e)),
        }
    }

    /// Connect to existing daemon (no auto-start)
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = daemon_socket()?;

        if !socket_path.exists() {
            let err = ClientError::DaemonNotRunning;
            log_connection_error(&err);
            return Err(err);
        }

        Ok(Self { socket_path })
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Ok(Some(status)) = child.try_wait() {
                // Lost a startup race to another daemon, which is serving
                if let Ok(client) = Self::connect() {
                    if probe_socket(&client.socket_path) {
                        return Ok(client);
                    }
                }
                // Daemon exited during startup; its log says why
                let poll_start = Instant::now();
                while poll_start.elapsed() < timeout_exit() {
                    if let Some(err) = read_startup_error() {
                        return Err(ClientError::DaemonStartFailed(err));
                    }
                    std::thread::sleep(poll_interval());
                }
                return Err(ClientError::DaemonStartFailed(format!(
                    "exited with {}",
                    status
                )));
            }

            match Self::connect() {
                Ok(client) if probe_socket(&client.socket_path) => return Ok(client),
                Ok(_) | Err(ClientError::DaemonNotRunning) => {
                    std::thread::sleep(poll_interval());
                }
                Err(e) => return Err(wrap_with_startup_error(e)),
            }
        }

        Err(wrap_with_startup_error(ClientError::DaemonStartTimeout))
    }

    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        protocol::write_request(&mut writer, request, write_timeout).await?;
        let response = protocol::read_response(&mut reader, read_timeout).await?;
        Ok(response)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        match self
            .send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
        {
            Ok(response) => Ok(response),
            Err(e) => {
                log_connection_error(&e);
                Err(e)
            }
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: PROTOCOL_VERSION.to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status {
                uptime_secs,
                jobs_total,
                jobs_running,
            } => Ok(DaemonStatus {
                uptime_secs,
                jobs_total,
                jobs_running,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self, kill: bool) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown { kill }).await? {
            Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Start a command as a job, returning its id
    pub async fn start_job(
        &self,
        command: &str,
        args: &[String],
        cwd: Option<PathBuf>,
        env: HashMap<String, String>,
    ) -> Result<JobId, ClientError> {
        let request = Request::Start {
            command: command.to_string(),
            args: args.to_vec(),
            cwd,
            env,
        };
        match self.send(&request).await? {
            Response::Started { id } => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    pub async fn stop_job(&self, id: &str) -> Result<JobId, ClientError> {
        let request = Request::Stop { id: id.to_string() };
        match self.send(&request).await? {
            Response::Stopped { id } => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    pub async fn job_status(&self, id: &str) -> Result<JobInfo, ClientError> {
        let request = Request::QueryStatus { id: id.to_string() };
        match self.send(&request).await? {
            Response::Job { job } => Ok(*job),
            other => Err(unexpected(other)),
        }
    }

    /// Output captured so far, concatenated
    pub async fn job_output(&self, id: &str) -> Result<String, ClientError> {
        let request = Request::GetOutput { id: id.to_string() };
        match self.send(&request).await? {
            Response::Output { output, .. } => Ok(output),
            other => Err(unexpected(other)),
        }
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobInfo>, ClientError> {
        match self.send(&Request::ListJobs).await? {
            Response::Jobs { jobs } => Ok(jobs),
            other => Err(unexpected(other)),
        }
    }

    /// Open an output subscription for a job.
    ///
    /// An unknown id is reported here, not by the first [`OutputStream::next`].
    pub async fn subscribe_output(&self, id: &str) -> Result<OutputStream, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let request = Request::SubscribeOutput { id: id.to_string() };
        protocol::write_request(&mut writer, &request, timeout_ipc()).await?;

        // First frame decides: an error, or the start of the stream
        match read_frame(&mut reader).await? {
            first @ (Response::Line { .. } | Response::EndOfStream { .. }) => Ok(OutputStream {
                reader,
                _writer: writer,
                pending: Some(first),
                ended: false,
            }),
            other => Err(unexpected(other)),
        }
    }
}

/// Stop the running daemon if its version differs from ours.
///
/// Returns `true` if a restart was triggered.
fn restart_if_stale_version() -> bool {
    let Ok(dir) = daemon_dir() else {
        return false;
    };
    let Ok(daemon_version) = std::fs::read_to_string(dir.join("daemon.version")) else {
        return false;
    };
    if daemon_version.trim() == PROTOCOL_VERSION {
        return false;
    }
    eprintln!(
        "warn: daemon version {} does not match cli version {}, restarting daemon",
        daemon_version.trim(),
        PROTOCOL_VERSION
    );
    stop_daemon_sync();
    true
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

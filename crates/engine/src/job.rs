// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single supervised child process.
//!
//! [`Job::start`] spawns the process and hands the [`Child`] to a monitor
//! task, which is the only place that waits on or signals it. Everything a
//! caller does afterwards (stop, status, reads) goes through the shared
//! [`Job`] handle.
//!
//! [`Child`]: tokio::process::Child

use crate::capture::{self, Stream};
use crate::error::EngineError;
use crate::monitor::{self, StopReply};
use crate::sandbox::{NoSandbox, SandboxPolicy};
use jw_core::{epoch_ms, JobId, JobInfo, JobStatus, LogCursor, OutputLog};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot, watch};

/// Grace period between SIGINT and SIGKILL on stop
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// How long to keep capturing after the process exits
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobSpec {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl JobSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Supervision settings shared by every job a registry starts.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub stop_grace: Duration,
    pub drain_timeout: Duration,
    pub sandbox: Arc<dyn SandboxPolicy>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            stop_grace: DEFAULT_STOP_GRACE,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            sandbox: Arc::new(NoSandbox),
        }
    }
}

impl JobOptions {
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn SandboxPolicy>) -> Self {
        self.sandbox = sandbox;
        self
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ExitRecord {
    pub finished_at_ms: Option<u64>,
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
}

/// Handle to a running or finished job.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    spec: JobSpec,
    pid: Option<u32>,
    started_at_ms: u64,
    status: watch::Sender<JobStatus>,
    log: OutputLog,
    exit: Mutex<ExitRecord>,
    stop_tx: mpsc::Sender<StopReply>,
}

impl Job {
    /// Spawn `spec` and begin supervising it.
    ///
    /// Must be called from within a Tokio runtime. The returned job is
    /// already `Running`; capture and monitoring run as background tasks.
    pub fn start(id: JobId, spec: JobSpec, options: &JobOptions) -> Result<Arc<Job>, EngineError> {
        let spawn_error = |source| EngineError::Spawn {
            command: spec.command.clone(),
            source,
        };

        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        options.sandbox.apply(&mut cmd).map_err(spawn_error)?;

        let mut child = cmd.spawn().map_err(spawn_error)?;
        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (status, _) = watch::channel(JobStatus::Running);
        let (stop_tx, stop_rx) = mpsc::channel(8);
        let job = Arc::new(Job {
            id,
            spec,
            pid,
            started_at_ms: epoch_ms(),
            status,
            log: OutputLog::new(),
            exit: Mutex::new(ExitRecord::default()),
            stop_tx,
        });

        let mut captures = Vec::with_capacity(2);
        if let Some(out) = stdout {
            captures.push(capture::spawn(
                job.id.clone(),
                Stream::Stdout,
                out,
                job.log.clone(),
                job.status.subscribe(),
            ));
        }
        if let Some(err) = stderr {
            captures.push(capture::spawn(
                job.id.clone(),
                Stream::Stderr,
                err,
                job.log.clone(),
                job.status.subscribe(),
            ));
        }

        tracing::info!(
            job_id = %job.id,
            pid = ?pid,
            command = %job.spec.command,
            sandbox = options.sandbox.name(),
            "job started"
        );

        tokio::spawn(monitor::run(
            Arc::clone(&job),
            child,
            stop_rx,
            captures,
            options.clone(),
        ));

        Ok(job)
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn status(&self) -> JobStatus {
        *self.status.borrow()
    }

    /// Watch status changes. The receiver sees the current value first.
    pub fn subscribe_status(&self) -> watch::Receiver<JobStatus> {
        self.status.subscribe()
    }

    /// Ask the process group to interrupt and mark the job `Terminated`.
    ///
    /// Fails with [`EngineError::NotRunning`] if the job has already reached
    /// a terminal state, including when a concurrent stop won the race.
    /// Escalates to SIGKILL if the process outlives the grace period.
    pub async fn stop(&self) -> Result<(), EngineError> {
        if self.status().is_terminal() {
            return Err(EngineError::NotRunning(self.id.clone()));
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.stop_tx.send(reply_tx).await.is_err() {
            return Err(EngineError::NotRunning(self.id.clone()));
        }
        reply_rx
            .await
            .unwrap_or_else(|_| Err(EngineError::NotRunning(self.id.clone())))
    }

    /// New cursor over this job's output, starting at the first line.
    pub fn new_log_reader(&self) -> LogCursor {
        self.log.reader()
    }

    pub fn log(&self) -> &OutputLog {
        &self.log
    }

    /// Every line captured so far.
    pub fn read_all_lines(&self) -> Vec<String> {
        self.log.snapshot()
    }

    /// Captured output joined into one string.
    pub fn output(&self) -> String {
        self.log.snapshot().concat()
    }

    /// Wait until the job is terminal and its output is complete.
    pub async fn wait(&self) -> JobStatus {
        self.log.sealed().await;
        self.status()
    }

    pub fn info(&self) -> JobInfo {
        let exit = *self.exit.lock();
        JobInfo {
            id: self.id.clone(),
            command: self.spec.command.clone(),
            args: self.spec.args.clone(),
            status: self.status(),
            pid: self.pid,
            started_at_ms: self.started_at_ms,
            finished_at_ms: exit.finished_at_ms,
            exit_code: exit.exit_code,
            signal: exit.signal,
            lines: self.log.len(),
        }
    }

    /// Move to `to` if still `Running`. Returns `true` if this call made
    /// the change.
    pub(crate) fn try_transition(&self, to: JobStatus) -> bool {
        self.status.send_if_modified(|status| match status.transition(to) {
            Ok(next) => {
                *status = next;
                true
            }
            Err(_) => false,
        })
    }

    /// Like [`Job::try_transition`], but only commits the change when
    /// `effect` succeeds. The effect runs while the status is held, so no
    /// other transition can interleave.
    pub(crate) fn transition_with<E>(
        &self,
        to: JobStatus,
        effect: impl FnOnce() -> Result<(), E>,
    ) -> Option<Result<(), E>> {
        let mut outcome = None;
        self.status.send_if_modified(|status| {
            let Ok(next) = status.transition(to) else {
                return false;
            };
            match effect() {
                Ok(()) => {
                    *status = next;
                    outcome = Some(Ok(()));
                    true
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    false
                }
            }
        });
        outcome
    }

    pub(crate) fn record_exit(&self, record: ExitRecord) {
        *self.exit.lock() = record;
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job monitor task.
//!
//! Owns the child process for its whole life: serves stop requests while
//! the child runs, reaps it, finalizes the status, drains capture, and
//! finally seals the log. Signals are only ever sent from here, before the
//! child has been reaped, so a recycled pid is never targeted.

use crate::error::EngineError;
use crate::job::{ExitRecord, Job, JobOptions};
use crate::signal::{signal_group, SIGINT, SIGKILL};
use jw_core::{epoch_ms, JobStatus};
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::Arc;
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Reply channel for one stop request
pub(crate) type StopReply = oneshot::Sender<Result<(), EngineError>>;

pub(crate) async fn run(
    job: Arc<Job>,
    mut child: Child,
    mut stop_rx: mpsc::Receiver<StopReply>,
    captures: Vec<JoinHandle<()>>,
    options: JobOptions,
) {
    let mut kill_at: Option<Instant> = None;

    let exit = loop {
        tokio::select! {
            result = child.wait() => break result,
            Some(reply) = stop_rx.recv() => {
                let result = interrupt(&job, &child);
                if result.is_ok() && kill_at.is_none() {
                    kill_at = Some(Instant::now() + options.stop_grace);
                }
                let _ = reply.send(result);
            }
            _ = tokio::time::sleep_until(kill_at.unwrap_or_else(Instant::now)), if kill_at.is_some() => {
                kill_at = None;
                if let Some(pid) = child.id() {
                    tracing::warn!(job_id = %job.id(), pid, "job ignored interrupt, killing");
                    if let Err(e) = signal_group(pid, SIGKILL) {
                        tracing::warn!(job_id = %job.id(), error = %e, "failed to kill job");
                    }
                }
            }
        }
    };

    let (record, outcome) = match &exit {
        Ok(status) => (
            ExitRecord {
                finished_at_ms: Some(epoch_ms()),
                exit_code: status.code(),
                signal: status.signal(),
            },
            outcome_for(*status),
        ),
        Err(e) => {
            tracing::error!(job_id = %job.id(), error = %e, "failed to wait for job");
            (
                ExitRecord {
                    finished_at_ms: Some(epoch_ms()),
                    ..ExitRecord::default()
                },
                JobStatus::Failed,
            )
        }
    };
    // Recorded before the transition so a terminal status always comes
    // with its exit details, even while a grandchild holds the pipes open.
    job.record_exit(record);
    job.try_transition(outcome);

    // Stops that raced with the exit are answered before the drain.
    stop_rx.close();
    while let Ok(reply) = stop_rx.try_recv() {
        let _ = reply.send(Err(EngineError::NotRunning(job.id().clone())));
    }

    drain(&job, captures, &options).await;
    job.log().seal();

    tracing::info!(
        job_id = %job.id(),
        status = %job.status(),
        exit_code = ?record.exit_code,
        signal = ?record.signal,
        lines = job.log().len(),
        "job finished"
    );
}

/// Status a naturally exiting process earns.
pub(crate) fn outcome_for(status: ExitStatus) -> JobStatus {
    if status.success() {
        JobStatus::Completed
    } else {
        JobStatus::Failed
    }
}

fn interrupt(job: &Job, child: &Child) -> Result<(), EngineError> {
    let Some(pid) = child.id() else {
        return Err(EngineError::NotRunning(job.id().clone()));
    };
    let outcome = job.transition_with(JobStatus::Terminated, || signal_group(pid, SIGINT));
    match outcome {
        Some(Ok(())) => {
            tracing::info!(job_id = %job.id(), pid, "job stopped");
            Ok(())
        }
        Some(Err(source)) => Err(EngineError::Signal {
            id: job.id().clone(),
            source,
        }),
        None => Err(EngineError::NotRunning(job.id().clone())),
    }
}

async fn drain(job: &Job, captures: Vec<JoinHandle<()>>, options: &JobOptions) {
    let deadline = Instant::now() + options.drain_timeout;
    for mut handle in captures {
        if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
            tracing::warn!(
                job_id = %job.id(),
                "output still open after drain timeout, abandoning capture"
            );
            handle.abort();
        }
    }
}

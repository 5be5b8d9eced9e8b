// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output capture: one task per child stream, appending to the job's log.

use jw_core::{JobId, JobStatus, OutputLog};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Which child stream a capture task reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn as_str(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

/// Spawn a task that reads `reader` line by line into `log`.
///
/// Lines keep their trailing newline; a final chunk without one is appended
/// as-is. Invalid UTF-8 is replaced rather than rejected. The task ends at
/// end-of-stream, on a read error, or as soon as the job is stopped.
pub(crate) fn spawn<R>(
    job_id: JobId,
    stream: Stream,
    reader: R,
    log: OutputLog,
    mut status: watch::Receiver<JobStatus>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            tokio::select! {
                read = reader.read_until(b'\n', &mut buf) => match read {
                    Ok(0) => {
                        tracing::debug!(job_id = %job_id, stream = stream.as_str(), "capture stream closed");
                        break;
                    }
                    Ok(_) => {
                        log.append(String::from_utf8_lossy(&buf).into_owned());
                    }
                    Err(e) => {
                        tracing::warn!(
                            job_id = %job_id,
                            stream = stream.as_str(),
                            error = %e,
                            "output capture failed"
                        );
                        break;
                    }
                },
                _ = status.wait_for(|s| *s == JobStatus::Terminated) => {
                    tracing::debug!(job_id = %job_id, stream = stream.as_str(), "capture stopped with job");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-push output stream for `SubscribeOutput`.
//!
//! Each subscription gets its own cursor starting at the first line. Lines
//! are written as `Line` messages until the log is sealed, then a single
//! `EndOfStream` carries the job's final status. The blocking read is raced
//! against the client half of the socket so a disconnect cancels it at once.
//! A client that only shuts down its write side keeps receiving the stream;
//! if it later goes away, the next failed write ends the subscription.

use std::io;

use jw_daemon::protocol::{self, ProtocolError, Response, DEFAULT_TIMEOUT};
use tokio::io::{AsyncReadExt, Interest};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tracing::debug;

use super::{engine_error, ConnectionError, ListenCtx};

/// What a read on the client half tells us about the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientHalf {
    /// Still open; stray bytes are ignored
    Open,
    /// Write side shut down, still listening
    HalfClosed,
    Gone,
}

pub(super) async fn handle_subscribe(
    id: &str,
    ctx: &ListenCtx,
    reader: &mut OwnedReadHalf,
    writer: &mut OwnedWriteHalf,
) -> Result<(), ConnectionError> {
    let job = match ctx.registry.get(id) {
        Ok(job) => job,
        Err(e) => {
            protocol::write_response(writer, &engine_error(&e), DEFAULT_TIMEOUT).await?;
            return Ok(());
        }
    };

    let mut cursor = job.new_log_reader();
    let mut scratch = [0u8; 64];
    let mut client_open = true;
    debug!(job_id = %job.id(), "output subscription opened");

    loop {
        let next = tokio::select! {
            line = cursor.next_line() => line,
            read = reader.read(&mut scratch), if client_open => {
                match client_half(read, writer).await {
                    ClientHalf::Open => {}
                    ClientHalf::HalfClosed => {
                        debug!(job_id = %job.id(), "subscriber half-closed, streaming on");
                        client_open = false;
                    }
                    ClientHalf::Gone => {
                        debug!(job_id = %job.id(), lines = cursor.position(), "subscriber disconnected");
                        return Ok(());
                    }
                }
                continue;
            }
        };

        let (response, end) = match next {
            Some(line) => (Response::Line { line }, false),
            None => (Response::EndOfStream { status: job.status() }, true),
        };
        match protocol::write_response(writer, &response, DEFAULT_TIMEOUT).await {
            Ok(()) => {}
            Err(e) if is_disconnect(&e) => {
                debug!(job_id = %job.id(), lines = cursor.position(), "subscriber went away mid-stream");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
        if end {
            debug!(job_id = %job.id(), status = %job.status(), lines = cursor.position(), "output subscription ended");
            return Ok(());
        }
    }
}

/// Classify a read on the client half.
///
/// EOF alone cannot tell a half-close from a full close; a full close also
/// hangs up the write direction, which the socket's readiness reports.
async fn client_half(read: io::Result<usize>, writer: &OwnedWriteHalf) -> ClientHalf {
    match read {
        Ok(0) => match writer.as_ref().ready(Interest::WRITABLE).await {
            Ok(ready) if !ready.is_write_closed() => ClientHalf::HalfClosed,
            _ => ClientHalf::Gone,
        },
        Ok(_) => ClientHalf::Open,
        Err(_) => ClientHalf::Gone,
    }
}

fn is_disconnect(e: &ProtocolError) -> bool {
    match e {
        ProtocolError::ConnectionClosed => true,
        ProtocolError::Io(io) => matches!(
            io.kind(),
            io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
        ),
        _ => false,
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and handling
//! each one in its own task. Requests are answered directly from the job
//! registry; output subscriptions keep their connection open and stream.

mod mutations;
mod query;
mod stream;
#[cfg(test)]
mod test_helpers;

use std::sync::Arc;
use std::time::Instant;

use jw_daemon::protocol::{self, ErrorKind, ProtocolError, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};
use jw_engine::{EngineError, JobRegistry};
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::auth::{AuthPolicy, Role};

/// Shared context for every connection.
pub struct ListenCtx {
    pub registry: Arc<JobRegistry>,
    pub auth: AuthPolicy,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Listener {
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { socket, ctx }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
                                    debug!("Client disconnected")
                                }
                                ConnectionError::Protocol(ProtocolError::Timeout) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(stream: UnixStream, ctx: &ListenCtx) -> Result<(), ConnectionError> {
    let uid = match stream.peer_cred() {
        Ok(cred) => Some(cred.uid()),
        Err(e) => {
            warn!(error = %e, "could not read peer credentials");
            None
        }
    };
    let role = ctx.auth.role_for(uid);
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;

    if request.is_mutation() {
        info!(request = ?request, uid = ?uid, role = role.as_str(), "received request");
    } else {
        debug!(request = ?request, uid = ?uid, "received query");
    }

    if let Request::SubscribeOutput { id } = &request {
        return stream::handle_subscribe(id, ctx, &mut reader, &mut writer).await;
    }

    let response = handle_request(request, role, ctx).await;
    debug!("Sending response: {:?}", response);
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

/// Handle a single request and return a response.
async fn handle_request(request: Request, role: Role, ctx: &ListenCtx) -> Response {
    if let Some(denied) = ctx.auth.check(role, &request) {
        warn!(request = ?request, role = role.as_str(), "request denied");
        return denied;
    }

    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Status => query::handle_status(ctx),

        Request::Shutdown { kill } => mutations::handle_shutdown(ctx, kill).await,

        Request::Start {
            command,
            args,
            cwd,
            env,
        } => mutations::handle_start(ctx, command, args, cwd, env),

        Request::Stop { id } => mutations::handle_stop(ctx, &id).await,

        Request::QueryStatus { id } => query::handle_query_status(ctx, &id),

        Request::GetOutput { id } => query::handle_get_output(ctx, &id),

        Request::ListJobs => query::handle_list_jobs(ctx),

        Request::SubscribeOutput { .. } => Response::error(
            ErrorKind::Invalid,
            "output subscriptions are served on a streaming connection",
        ),
    }
}

/// Wire form of an engine error.
fn engine_error(e: &EngineError) -> Response {
    let kind = match e {
        EngineError::NotFound(_) => ErrorKind::NotFound,
        EngineError::NotRunning(_) => ErrorKind::NotRunning,
        EngineError::Spawn { .. } => ErrorKind::Spawn,
        EngineError::Signal { .. } => ErrorKind::Signal,
        EngineError::DuplicateId(_) => ErrorKind::Invalid,
    };
    Response::error(kind, e.to_string())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

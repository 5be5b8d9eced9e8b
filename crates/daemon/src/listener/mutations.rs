// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers that change job or daemon state.

use std::collections::HashMap;
use std::path::PathBuf;

use jw_daemon::protocol::{ErrorKind, Response};
use jw_engine::JobSpec;
use tracing::info;

use super::{engine_error, ListenCtx};

pub(super) fn handle_start(
    ctx: &ListenCtx,
    command: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: HashMap<String, String>,
) -> Response {
    if command.trim().is_empty() {
        return Response::error(ErrorKind::Invalid, "command must not be empty");
    }

    let mut spec = JobSpec::new(command).args(args);
    if let Some(cwd) = cwd {
        spec = spec.cwd(cwd);
    }
    let mut env: Vec<(String, String)> = env.into_iter().collect();
    env.sort();
    spec.env = env;

    match ctx.registry.start(spec) {
        Ok(job) => Response::Started {
            id: job.id().clone(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to start job");
            engine_error(&e)
        }
    }
}

pub(super) async fn handle_stop(ctx: &ListenCtx, id: &str) -> Response {
    let job = match ctx.registry.get(id) {
        Ok(job) => job,
        Err(e) => return engine_error(&e),
    };
    match job.stop().await {
        Ok(()) => Response::Stopped {
            id: job.id().clone(),
        },
        Err(e) => engine_error(&e),
    }
}

pub(super) async fn handle_shutdown(ctx: &ListenCtx, kill: bool) -> Response {
    if kill {
        let stopped = ctx.registry.stop_all().await;
        info!(stopped, "stopped running jobs before shutdown");
    }
    ctx.shutdown.notify_one();
    Response::ShuttingDown
}

#[cfg(test)]
#[path = "mutations_tests.rs"]
mod tests;

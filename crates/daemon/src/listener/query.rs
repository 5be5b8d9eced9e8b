// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only handlers.

use jw_daemon::protocol::Response;

use super::{engine_error, ListenCtx};

pub(super) fn handle_status(ctx: &ListenCtx) -> Response {
    Response::Status {
        uptime_secs: ctx.start_time.elapsed().as_secs(),
        jobs_total: ctx.registry.len(),
        jobs_running: ctx.registry.running_count(),
    }
}

pub(super) fn handle_query_status(ctx: &ListenCtx, id: &str) -> Response {
    match ctx.registry.get(id) {
        Ok(job) => Response::Job {
            job: Box::new(job.info()),
        },
        Err(e) => engine_error(&e),
    }
}

pub(super) fn handle_get_output(ctx: &ListenCtx, id: &str) -> Response {
    match ctx.registry.get(id) {
        Ok(job) => Response::Output {
            id: job.id().clone(),
            output: job.output(),
        },
        Err(e) => engine_error(&e),
    }
}

pub(super) fn handle_list_jobs(ctx: &ListenCtx) -> Response {
    Response::Jobs {
        jobs: ctx.registry.list(),
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for listener tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jw_core::SequentialIdGen;
use jw_engine::{JobOptions, JobRegistry};
use tokio::sync::Notify;

use super::ListenCtx;
use crate::auth::AuthPolicy;

pub(crate) const FINISH: Duration = Duration::from_secs(10);

pub(crate) fn job_options() -> JobOptions {
    JobOptions::default()
        .with_stop_grace(Duration::from_secs(2))
        .with_drain_timeout(Duration::from_millis(500))
}

/// Context whose registry issues `job-1`, `job-2`, ... and where the
/// given uids are admins.
pub(crate) fn ctx_with_admins(admins: impl IntoIterator<Item = u32>) -> ListenCtx {
    ListenCtx {
        registry: Arc::new(JobRegistry::with_id_gen(
            SequentialIdGen::new("job"),
            job_options(),
        )),
        auth: AuthPolicy::with_admins(admins),
        start_time: Instant::now(),
        shutdown: Arc::new(Notify::new()),
    }
}

pub(crate) fn test_ctx() -> ListenCtx {
    ctx_with_admins([])
}

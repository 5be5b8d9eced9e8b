// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional `config.toml` in the state directory.
//!
//! Every key has a default, so a missing file (or a missing section) is the
//! same as an empty one. Environment overrides are applied on top.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jw_engine::{JobOptions, NoSandbox};
use serde::Deserialize;

use crate::env;
use crate::lifecycle::LifecycleError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub jobs: JobSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobSettings {
    /// Delay between SIGINT and SIGKILL when a job is stopped
    pub stop_grace_ms: u64,
    /// How long capture may keep draining after the process exits
    pub drain_timeout_ms: u64,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            stop_grace_ms: 5_000,
            drain_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSettings {
    /// Extra uids allowed to start and stop jobs
    pub admin_uids: Vec<u32>,
}

impl Settings {
    /// Load from `path` if it exists, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        let mut settings = match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text)
                .map_err(|e| LifecycleError::Config(path.to_path_buf(), e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(LifecycleError::Io(e)),
        };
        settings.apply_env();
        Ok(settings)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn apply_env(&mut self) {
        if let Some(grace) = env::stop_grace_ms() {
            self.jobs.stop_grace_ms = grace.as_millis() as u64;
        }
        if let Some(drain) = env::drain_timeout_ms() {
            self.jobs.drain_timeout_ms = drain.as_millis() as u64;
        }
    }

    pub fn job_options(&self) -> JobOptions {
        JobOptions::default()
            .with_stop_grace(Duration::from_millis(self.jobs.stop_grace_ms))
            .with_drain_timeout(Duration::from_millis(self.jobs.drain_timeout_ms))
            .with_sandbox(Arc::new(NoSandbox))
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;

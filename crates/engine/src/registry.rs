// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lookup table of every job the daemon has started.

use crate::error::EngineError;
use crate::job::{Job, JobOptions, JobSpec};
use jw_core::{IdGen, JobId, JobInfo, JobStatus, UuidIdGen};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Owns every job for the life of the process.
///
/// Entries are never removed, so finished jobs stay queryable.
pub struct JobRegistry {
    table: RwLock<Table>,
    ids: Box<dyn IdGen>,
    options: JobOptions,
}

#[derive(Default)]
struct Table {
    jobs: HashMap<JobId, Arc<Job>>,
    /// Ids handed out by `fresh_id` and not yet registered
    reserved: HashSet<JobId>,
}

impl JobRegistry {
    /// Registry issuing random UUID ids.
    pub fn new(options: JobOptions) -> Self {
        Self::with_id_gen(UuidIdGen, options)
    }

    pub fn with_id_gen(ids: impl IdGen + 'static, options: JobOptions) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            ids: Box::new(ids),
            options,
        }
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Spawn `spec` under a fresh id and register it.
    pub fn start(&self, spec: JobSpec) -> Result<Arc<Job>, EngineError> {
        let id = self.fresh_id();
        let started = Job::start(id.clone(), spec, &self.options);

        let mut table = self.table.write();
        table.reserved.remove(&id);
        let job = started?;
        table.jobs.insert(id, Arc::clone(&job));
        Ok(job)
    }

    /// Add an already started job, returning the id it is stored under.
    ///
    /// Fails with [`EngineError::DuplicateId`] if the id is registered or
    /// reserved by a start in progress.
    pub fn register(&self, job: Arc<Job>) -> Result<JobId, EngineError> {
        let id = job.id().clone();
        let mut table = self.table.write();
        if table.reserved.contains(&id) {
            return Err(EngineError::DuplicateId(id));
        }
        match table.jobs.entry(id.clone()) {
            Entry::Occupied(_) => Err(EngineError::DuplicateId(id)),
            Entry::Vacant(slot) => {
                slot.insert(job);
                Ok(id)
            }
        }
    }

    /// Draw ids until one is neither registered nor reserved, and reserve it.
    ///
    /// The reservation is released by [`JobRegistry::start`] once the job
    /// is stored or its spawn failed.
    fn fresh_id(&self) -> JobId {
        let mut table = self.table.write();
        loop {
            let id = JobId::new(self.ids.next());
            if !table.jobs.contains_key(&id) && table.reserved.insert(id.clone()) {
                return id;
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<Arc<Job>, EngineError> {
        self.table
            .read()
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(JobId::new(id)))
    }

    /// Snapshot of every job, oldest first.
    pub fn list(&self) -> Vec<JobInfo> {
        let mut infos: Vec<JobInfo> = self.table.read().jobs.values().map(|job| job.info()).collect();
        infos.sort_by(|a, b| {
            a.started_at_ms
                .cmp(&b.started_at_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        infos
    }

    pub fn len(&self) -> usize {
        self.table.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn running_count(&self) -> usize {
        self.table
            .read()
            .jobs
            .values()
            .filter(|job| job.status() == JobStatus::Running)
            .count()
    }

    /// Stop every running job. Returns how many were stopped.
    pub async fn stop_all(&self) -> usize {
        let running: Vec<Arc<Job>> = self
            .table
            .read()
            .jobs
            .values()
            .filter(|job| job.status() == JobStatus::Running)
            .cloned()
            .collect();

        let mut stopped = 0;
        for job in running {
            match job.stop().await {
                Ok(()) => stopped += 1,
                Err(EngineError::NotRunning(_)) => {}
                Err(e) => tracing::warn!(job_id = %job.id(), error = %e, "failed to stop job"),
            }
        }
        stopped
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

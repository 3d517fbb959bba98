use dashmap::DashMap;

use crate::error::{Result, SchedulerError};
use crate::scheduler::job::{Job, JobId, JobStatus};

/// Authoritative in-memory record of every job, keyed by id.
///
/// Individual operations are safe to call concurrently. Status changes go
/// through [`JobStore::transition`], which checks the current status and
/// applies the update while holding the entry lock, so a stopped job can
/// never be overwritten by a late completion.
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: DashMap<JobId, Job>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: Job) {
        self.jobs.insert(job.id, job);
    }

    /// Snapshot of a single job.
    pub fn get(&self, id: JobId) -> Option<Job> {
        self.jobs.get(&id).map(|entry| entry.value().clone())
    }

    /// Overwrite an existing record wholesale.
    ///
    /// A record that carries a different status is held to the same
    /// lifecycle edges as [`JobStore::transition`]; a terminal job cannot be
    /// rewritten into another state.
    pub fn replace(&self, job: Job) -> Result<()> {
        let mut entry = self
            .jobs
            .get_mut(&job.id)
            .ok_or(SchedulerError::NotFound(job.id))?;
        let current = entry.value().status;
        if current != job.status && !current.can_transition_to(job.status) {
            return Err(SchedulerError::StateConflict {
                job_id: job.id,
                status: current,
            });
        }
        *entry = job;
        Ok(())
    }

    /// Move a job to `next` and let `apply` fill in the fields that go with it.
    ///
    /// Fails with `NotFound` for unknown ids and with `StateConflict` when
    /// `current -> next` is not a lifecycle edge; in both cases nothing is written.
    pub fn transition<F>(&self, id: JobId, next: JobStatus, apply: F) -> Result<Job>
    where
        F: FnOnce(&mut Job),
    {
        let mut entry = self.jobs.get_mut(&id).ok_or(SchedulerError::NotFound(id))?;
        let job = entry.value_mut();
        if !job.status.can_transition_to(next) {
            return Err(SchedulerError::StateConflict {
                job_id: id,
                status: job.status,
            });
        }
        job.status = next;
        apply(job);
        Ok(job.clone())
    }

    pub fn remove(&self, id: JobId) -> Option<Job> {
        self.jobs.remove(&id).map(|(_, job)| job)
    }

    /// Remove `id` only if the predicate holds for its current record.
    pub(crate) fn remove_if<F>(&self, id: JobId, predicate: F) -> Option<Job>
    where
        F: FnOnce(&Job) -> bool,
    {
        self.jobs
            .remove_if(&id, |_, job| predicate(job))
            .map(|(_, job)| job)
    }

    /// Drop every record the predicate rejects. Returns how many were removed.
    pub(crate) fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&Job) -> bool,
    {
        let mut removed = 0;
        self.jobs.retain(|_, job| {
            let kept = keep(job);
            if !kept {
                removed += 1;
            }
            kept
        });
        removed
    }

    /// Copy of all records, in no particular order.
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

use crate::error::{Result, SchedulerError};
use crate::scheduler::job::{Job, JobId};
use crate::scheduler::store::JobStore;

impl JobStore {
    /// Remove every completed, failed or stopped job. Returns the number removed.
    pub fn remove_all_terminal(&self) -> usize {
        let removed = self.retain(|job| !job.status.is_terminal());
        tracing::info!(removed, "Removed finished jobs");
        removed
    }

    /// Remove a single finished job and hand back its final record.
    pub fn remove_terminal(&self, id: JobId) -> Result<Job> {
        if let Some(job) = self.remove_if(id, |job| job.status.is_terminal()) {
            tracing::info!(job_id = id, status = %job.status, "Removed job");
            return Ok(job);
        }
        match self.get(id) {
            None => Err(SchedulerError::NotFound(id)),
            Some(job) => Err(SchedulerError::StateConflict {
                job_id: id,
                status: job.status,
            }),
        }
    }
}

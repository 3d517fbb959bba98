use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::{Result, SchedulerError};
use crate::scheduler::job::{Job, JobStatus};
use crate::scheduler::store::JobStore;

/// Field a job listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Id,
    ScheduledTime,
}

impl FromStr for SortKey {
    type Err = SchedulerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "id" => Ok(SortKey::Id),
            "scheduled_time" | "scheduledTime" => Ok(SortKey::ScheduledTime),
            other => Err(SchedulerError::Validation(format!(
                "unknown sort key '{}', expected 'id' or 'scheduled_time'",
                other
            ))),
        }
    }
}

impl JobStore {
    /// Filtered, sorted snapshot of the store. Never modifies any record.
    ///
    /// Sorting by scheduled time requires every selected job to carry one;
    /// the first job without it is reported as `MissingField`.
    pub fn list(
        &self,
        status: Option<JobStatus>,
        sort: SortKey,
        ascending: bool,
    ) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .snapshot()
            .into_iter()
            .filter(|job| status.map_or(true, |s| job.status == s))
            .collect();

        match sort {
            SortKey::Id => jobs.sort_by_key(|job| job.id),
            SortKey::ScheduledTime => {
                if let Some(job) = jobs
                    .iter()
                    .filter(|job| job.scheduled_time.is_none())
                    .min_by_key(|job| job.id)
                {
                    return Err(SchedulerError::MissingField {
                        job_id: job.id,
                        field: "scheduled_time",
                    });
                }
                // Ties on time fall back to id so the order is total
                jobs.sort_by(|a, b| match a.scheduled_time.cmp(&b.scheduled_time) {
                    Ordering::Equal => a.id.cmp(&b.id),
                    other => other,
                });
            }
        }

        if !ascending {
            jobs.reverse();
        }
        Ok(jobs)
    }
}

use thiserror::Error;

use crate::scheduler::{JobId, JobStatus};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Job {job_id} cannot be changed in status {status}")]
    StateConflict { job_id: JobId, status: JobStatus },

    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job {job_id} has no {field}")]
    MissingField { job_id: JobId, field: &'static str },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchedulerError {
    /// Short machine-readable name, used as the key in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            SchedulerError::Validation(_) => "ValidationError",
            SchedulerError::StateConflict { .. } => "StateConflictError",
            SchedulerError::NotFound(_) => "NotFoundError",
            SchedulerError::MissingField { .. } => "MissingFieldError",
            SchedulerError::Internal(_) => "InternalError",
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

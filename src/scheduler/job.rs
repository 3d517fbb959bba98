use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Job identifier handed out by [`IdGenerator`](super::IdGenerator).
pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Scheduled,
    Executing,
    Completed,
    Failed,
    Stopped,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Queued,
        JobStatus::Scheduled,
        JobStatus::Executing,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Stopped,
    ];

    /// Completed, failed and stopped jobs never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Stopped
        )
    }

    /// Whether `self -> next` is an edge of the lifecycle graph:
    /// `{Queued, Scheduled} -> Executing -> {Completed, Failed}` and
    /// any non-terminal status `-> Stopped`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Queued | JobStatus::Scheduled, JobStatus::Executing) => true,
            (JobStatus::Executing, JobStatus::Completed | JobStatus::Failed) => true,
            (from, JobStatus::Stopped) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Scheduled => "SCHEDULED",
            JobStatus::Executing => "EXECUTING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Stopped => "STOPPED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SchedulerError::Validation(format!("unknown job status '{}'", s)))
    }
}

/// A submitted script and its lifecycle record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub script: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl Job {
    /// New jobs start `Scheduled` when they carry a dispatch time, `Queued` otherwise.
    pub fn new(id: JobId, script: String, scheduled_time: Option<DateTime<Utc>>) -> Self {
        let status = if scheduled_time.is_some() {
            JobStatus::Scheduled
        } else {
            JobStatus::Queued
        };
        Self {
            id,
            script,
            status,
            scheduled_time,
            stdout: None,
            error: None,
            execution_time_ms: None,
        }
    }
}

/// Parse a caller supplied dispatch time.
///
/// Accepts RFC 3339 timestamps (`2026-03-01T10:00:00Z`, `2026-03-01T10:00:00+02:00`)
/// and ISO local date-times without an offset (`2026-03-01T10:00:00`,
/// optionally with fractional seconds), which are taken as UTC.
pub fn parse_scheduled_time(raw: &str) -> Result<DateTime<Utc>, SchedulerError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|e| SchedulerError::Validation(format!("invalid scheduled time '{}': {}", raw, e)))
}

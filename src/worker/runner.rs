use std::sync::Arc;
use std::time::Instant;

use crate::scheduler::{CancellationRegistry, JobId, JobStatus, JobStore};
use crate::worker::engine::{OutputSink, ScriptEngine};

/// Runs one job through the script engine and records the outcome.
pub struct ExecutionRunner {
    store: Arc<JobStore>,
    registry: Arc<CancellationRegistry>,
    engine: Arc<dyn ScriptEngine>,
}

impl ExecutionRunner {
    pub fn new(
        store: Arc<JobStore>,
        registry: Arc<CancellationRegistry>,
        engine: Arc<dyn ScriptEngine>,
    ) -> Self {
        Self {
            store,
            registry,
            engine,
        }
    }

    /// Execute job `id` and write its terminal status back to the store.
    ///
    /// A job that was stopped (or removed) before or during the run keeps
    /// its current record: every write goes through a status transition
    /// that refuses to leave a terminal state.
    pub async fn run(&self, id: JobId) {
        let job = match self.store.transition(id, JobStatus::Executing, |_| {}) {
            Ok(job) => job,
            Err(e) => {
                tracing::debug!(job_id = id, error = %e, "Skipping job that can no longer run");
                self.registry.release(id);
                return;
            }
        };

        tracing::info!(job_id = id, "Executing job");

        let started = Instant::now();
        let mut out = OutputSink::new();
        let mut err = OutputSink::new();
        let outcome = self.engine.execute(&job.script, &mut out, &mut err).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let written = match outcome {
            Ok(()) => self.store.transition(id, JobStatus::Completed, |job| {
                job.stdout = Some(out.into_string());
                job.execution_time_ms = Some(elapsed_ms);
            }),
            Err(e) => self.store.transition(id, JobStatus::Failed, |job| {
                job.error = Some(e.message);
                job.execution_time_ms = Some(elapsed_ms);
            }),
        };

        match written {
            Ok(job) => {
                tracing::info!(
                    job_id = id,
                    status = %job.status,
                    execution_time_ms = elapsed_ms,
                    "Job finished"
                );
            }
            Err(e) => {
                tracing::warn!(job_id = id, error = %e, "Discarding result of job");
            }
        }

        self.registry.release(id);
    }
}

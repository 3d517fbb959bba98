use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;

use crate::config::SchedulerConfig;
use crate::error::{Result, SchedulerError};
use crate::scheduler::id::IdGenerator;
use crate::scheduler::job::{Job, JobId, JobStatus};
use crate::scheduler::query::SortKey;
use crate::scheduler::registry::CancellationRegistry;
use crate::scheduler::store::JobStore;
use crate::worker::{ExecutionRunner, ScriptEngine};

/// Job lifecycle manager: accepts scripts, dispatches them onto the worker
/// pool (now or at a later time) and answers queries about them.
///
/// # Dispatch
///
/// Every submission becomes a spawned task that
/// 1. sleeps until the job's scheduled time (if any),
/// 2. waits for one of `pool_size` worker permits,
/// 3. runs the job through the [`ExecutionRunner`].
///
/// The whole task races the job's cancellation token, so [`Scheduler::stop`]
/// keeps a pending timer from firing and drops work that is already running.
/// Waiting tasks are not bounded; submission never blocks on a full pool.
pub struct Scheduler {
    store: Arc<JobStore>,
    registry: Arc<CancellationRegistry>,
    ids: IdGenerator,
    runner: Arc<ExecutionRunner>,
    permits: Arc<Semaphore>,
}

impl Scheduler {
    pub fn new(config: &SchedulerConfig, engine: Arc<dyn ScriptEngine>) -> Self {
        let store = Arc::new(JobStore::new());
        let registry = Arc::new(CancellationRegistry::new());
        let runner = Arc::new(ExecutionRunner::new(
            store.clone(),
            registry.clone(),
            engine,
        ));

        Self {
            store,
            registry,
            ids: IdGenerator::new(),
            runner,
            permits: Arc::new(Semaphore::new(config.pool_size.max(1))),
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<CancellationRegistry> {
        &self.registry
    }

    /// Create a job for `script` and dispatch it.
    ///
    /// With `scheduled_time` the job starts `Scheduled` and is dispatched once
    /// that time is reached; a time in the past dispatches immediately. With
    /// `blocking` the call waits (without timeout) until the job has finished
    /// or been stopped and returns its record at that point; otherwise it
    /// returns the freshly created record right away.
    pub async fn submit(
        &self,
        script: String,
        blocking: bool,
        scheduled_time: Option<DateTime<Utc>>,
    ) -> Result<Job> {
        let id = self.ids.next();
        let job = Job::new(id, script, scheduled_time);
        self.store.insert(job.clone());

        let delay = scheduled_time
            .and_then(|at| (at - Utc::now()).to_std().ok())
            .unwrap_or(Duration::ZERO);

        // Registered before spawning so the task can never release it first
        let token = self.registry.register(id);
        let runner = self.runner.clone();
        let permits = self.permits.clone();

        tracing::info!(
            job_id = id,
            status = %job.status,
            delay_ms = delay.as_millis() as u64,
            blocking,
            "Job submitted"
        );

        let task = tokio::spawn(async move {
            let work = async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        tracing::error!(job_id = id, "Worker pool closed, job not dispatched");
                        return;
                    }
                };
                runner.run(id).await;
            };

            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(job_id = id, "Dispatched work cancelled");
                }
                _ = work => {}
            }
        });

        if !blocking {
            return Ok(job);
        }

        if let Err(e) = task.await {
            tracing::error!(job_id = id, error = %e, "Job task aborted");
            return Err(SchedulerError::Internal(format!(
                "job {} did not run to completion: {}",
                id, e
            )));
        }
        self.get(id)
    }

    pub fn get(&self, id: JobId) -> Result<Job> {
        self.store.get(id).ok_or(SchedulerError::NotFound(id))
    }

    /// All jobs, ordered by `sort`.
    pub fn list(&self, sort: SortKey, ascending: bool) -> Result<Vec<Job>> {
        self.store.list(None, sort, ascending)
    }

    /// Jobs currently in `status`, ordered by `sort`.
    pub fn list_by_status(
        &self,
        status: JobStatus,
        sort: SortKey,
        ascending: bool,
    ) -> Result<Vec<Job>> {
        self.store.list(Some(status), sort, ascending)
    }

    /// Stop a queued, scheduled or executing job.
    ///
    /// The job is marked `Stopped` first, which makes any later completion
    /// write from its runner a no-op, then its pending or running work is
    /// cancelled. Engines that cannot be interrupted may keep running in
    /// the background, but their result is discarded.
    pub fn stop(&self, id: JobId) -> Result<()> {
        self.store.transition(id, JobStatus::Stopped, |_| {})?;
        let cancelled = self.registry.cancel(id);
        tracing::info!(job_id = id, had_handle = cancelled, "Job stopped");
        Ok(())
    }

    /// Stop every job that has not finished yet; returns how many were stopped.
    ///
    /// Jobs that reach a terminal state while this runs are left as they are.
    pub fn stop_all_unfinished(&self) -> usize {
        self.store
            .snapshot()
            .into_iter()
            .filter(|job| !job.status.is_terminal())
            .filter(|job| self.stop(job.id).is_ok())
            .count()
    }

    /// Remove every completed, failed or stopped job; returns how many were removed.
    pub fn remove_all_terminal(&self) -> usize {
        self.store.remove_all_terminal()
    }

    /// Remove one finished job and return its final record.
    pub fn remove_by_id(&self, id: JobId) -> Result<Job> {
        self.store.remove_terminal(id)
    }
}

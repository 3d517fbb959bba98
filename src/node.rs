use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{run_api, ApiState};
use crate::config::NodeConfig;
use crate::scheduler::Scheduler;
use crate::shutdown::drain_jobs;
use crate::worker::{ProcessEngine, ScriptEngine};

/// A running service instance: one scheduler behind one HTTP listener.
pub struct Node {
    pub config: NodeConfig,
    pub scheduler: Arc<Scheduler>,
}

impl Node {
    /// Build a node that runs scripts through a [`ProcessEngine`] configured by `config.sandbox`.
    pub fn new(config: NodeConfig) -> Self {
        let engine = Arc::new(ProcessEngine::new(config.sandbox.clone()));
        Self::with_engine(config, engine)
    }

    pub fn with_engine(config: NodeConfig, engine: Arc<dyn ScriptEngine>) -> Self {
        let scheduler = Arc::new(Scheduler::new(&config.scheduler, engine));
        Self { config, scheduler }
    }

    /// Serve the HTTP API until `shutdown` fires, then stop unfinished jobs.
    ///
    /// Stopped jobs are not resumed on restart; nothing is persisted.
    pub async fn run(self, shutdown: CancellationToken) -> std::io::Result<()> {
        let state = ApiState {
            scheduler: self.scheduler.clone(),
        };
        let served = run_api(self.config.listen_addr, state, shutdown).await;

        // Runs even when the listener failed so no script process is left behind
        drain_jobs(&self.scheduler);
        served
    }
}

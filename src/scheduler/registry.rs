use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::scheduler::job::JobId;

/// Cancellation handles for dispatched work that has not finished yet.
///
/// Holds one token per non-terminal job. The token only ever requests
/// cancellation; job records are changed through the store.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    handles: DashMap<JobId, CancellationToken>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and record the handle for `id`. The returned clone is observed by the task.
    pub fn register(&self, id: JobId) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.handles.insert(id, token.clone()) {
            tracing::warn!(job_id = id, "Replacing existing cancellation handle");
            previous.cancel();
        }
        token
    }

    /// Cancel and drop the handle for `id`. Returns false if none was recorded.
    pub fn cancel(&self, id: JobId) -> bool {
        match self.handles.remove(&id) {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drop the handle for `id` without cancelling, once its work has finished.
    pub fn release(&self, id: JobId) -> bool {
        self.handles.remove(&id).is_some()
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

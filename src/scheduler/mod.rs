//! Job lifecycle management.
//!
//! - [`JobStore`]: concurrent map of job records, with guarded status transitions
//! - [`IdGenerator`]: strictly increasing job ids
//! - [`CancellationRegistry`]: cancellation handles of dispatched, unfinished jobs
//! - [`Scheduler`]: submit/stop/query/cleanup entry point driving the worker pool
//!
//! Listing lives in `query`, removal of finished jobs in `cleanup`; both
//! extend [`JobStore`].

pub mod cleanup;
pub mod dispatcher;
pub mod id;
pub mod job;
pub mod query;
pub mod registry;
pub mod store;

pub use dispatcher::Scheduler;
pub use id::IdGenerator;
pub use job::{parse_scheduled_time, Job, JobId, JobStatus};
pub use query::SortKey;
pub use registry::CancellationRegistry;
pub use store::JobStore;

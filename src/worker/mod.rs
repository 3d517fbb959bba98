//! Script execution.
//!
//! # Components
//!
//! - [`ScriptEngine`]: pluggable capability that runs script text into output sinks
//! - [`ProcessEngine`]: engine backed by an interpreter process, optionally in Docker
//! - [`ExecutionRunner`]: drives one job through an engine and records the result
//!
//! # Execution Flow
//!
//! 1. The scheduler hands a job id to [`ExecutionRunner::run`]
//! 2. The job moves to `Executing` and the engine gets fresh stdout/stderr sinks
//! 3. Success stores stdout, failure stores the engine's message, both with the elapsed time
//! 4. The job's cancellation handle is released

pub mod engine;
pub mod executor;
pub mod runner;

pub use engine::{ExecutionError, OutputSink, ScriptEngine};
pub use executor::ProcessEngine;
pub use runner::ExecutionRunner;

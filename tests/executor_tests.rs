use std::sync::Arc;
use std::time::{Duration, Instant};

use scriptbox::config::{SandboxConfig, SchedulerConfig};
use scriptbox::scheduler::{JobStatus, Scheduler};
use scriptbox::worker::{OutputSink, ProcessEngine, ScriptEngine};

/// Create a test engine running scripts with the local `sh`
fn test_engine() -> ProcessEngine {
    ProcessEngine::new(SandboxConfig::default())
}

async fn run(script: &str) -> (Result<(), String>, String, String) {
    let engine = test_engine();
    let mut out = OutputSink::new();
    let mut err = OutputSink::new();
    let result = engine
        .execute(script, &mut out, &mut err)
        .await
        .map_err(|e| e.message);
    (result, out.into_string(), err.into_string())
}

#[tokio::test]
async fn test_execute_simple_script() {
    let (result, out, err) = run("echo hello").await;

    assert!(result.is_ok());
    assert_eq!(out, "hello\n");
    assert!(err.is_empty());
}

#[tokio::test]
async fn test_execute_empty_output() {
    let (result, out, _) = run("true").await;

    assert!(result.is_ok());
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_execute_large_output() {
    let (result, out, _) = run("seq 1 1000").await;

    assert!(result.is_ok());
    assert_eq!(out.lines().count(), 1000);
}

#[tokio::test]
async fn test_execute_failure_without_stderr() {
    let (result, _, _) = run("exit 3").await;

    assert_eq!(result, Err("exit code: 3".to_string()));
}

#[tokio::test]
async fn test_execute_failure_uses_stderr() {
    let (result, out, err) = run("echo partial; echo 'error message' >&2; exit 1").await;

    assert_eq!(result, Err("error message".to_string()));
    assert_eq!(out, "partial\n");
    assert_eq!(err, "error message\n");
}

#[tokio::test]
async fn test_stderr_alone_is_not_a_failure() {
    let (result, _, err) = run("echo warning >&2").await;

    assert!(result.is_ok());
    assert_eq!(err, "warning\n");
}

#[tokio::test]
async fn test_missing_interpreter() {
    let engine = ProcessEngine::new(SandboxConfig {
        interpreter: vec!["definitely-not-an-interpreter-12345".to_string()],
        ..SandboxConfig::default()
    });
    let mut out = OutputSink::new();
    let mut err = OutputSink::new();

    let result = engine.execute("anything", &mut out, &mut err).await;

    let message = result.unwrap_err().message;
    assert!(message.contains("failed to start"), "{}", message);
}

#[tokio::test]
async fn test_script_is_passed_verbatim() {
    // Single quotes prevent variable expansion
    let (result, out, _) = run("echo 'hello $USER' | tr a-z A-Z").await;

    assert!(result.is_ok());
    assert_eq!(out, "HELLO $USER\n");
}

#[tokio::test]
async fn test_execute_script_larger_than_argument_limit() {
    // Well past the kernel's 128 KiB single-argument limit
    let script = format!("#{}\nprintf ok", "x".repeat(200 * 1024));

    let (result, out, err) = run(&script).await;

    assert_eq!(result, Ok(()), "stderr: {}", err);
    assert_eq!(out, "ok");
}

#[tokio::test]
async fn test_script_reads_no_arguments() {
    let (result, out, _) = run("echo $#").await;

    assert!(result.is_ok());
    assert_eq!(out, "0\n");
}

#[tokio::test]
async fn test_process_engine_behind_scheduler() {
    let scheduler = Scheduler::new(&SchedulerConfig::default(), Arc::new(test_engine()));

    let ok = scheduler
        .submit("printf hello".to_string(), true, None)
        .await
        .unwrap();
    assert_eq!(ok.status, JobStatus::Completed);
    assert_eq!(ok.stdout.as_deref(), Some("hello"));

    let failed = scheduler
        .submit("echo boom >&2; exit 2".to_string(), true, None)
        .await
        .unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_stopping_kills_running_process() {
    let scheduler = Scheduler::new(&SchedulerConfig::default(), Arc::new(test_engine()));
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("finished");

    let job = scheduler
        .submit(format!("sleep 1; touch '{}'", marker.display()), false, None)
        .await
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while scheduler.get(job.id).unwrap().status != JobStatus::Executing {
        assert!(Instant::now() < deadline, "job never started");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    scheduler.stop(job.id).unwrap();

    // Long enough for the script to have reached `touch` had it survived
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(!marker.exists(), "stopped script kept running");
    let job = scheduler.get(job.id).unwrap();
    assert_eq!(job.status, JobStatus::Stopped);
    assert!(job.stdout.is_none());
    assert!(scheduler.registry().is_empty());
}

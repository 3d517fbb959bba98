use std::io::Write;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::SandboxConfig;
use crate::worker::engine::{ExecutionError, OutputSink, ScriptEngine};

/// Script engine that feeds the script body to an interpreter process on stdin.
///
/// Streaming the body keeps scripts of any size clear of the kernel's
/// per-argument limit.
///
/// Without a Docker image the interpreter runs directly on the host. With
/// one, every script runs in a throwaway container with:
/// - Network isolation (disabled by default)
/// - Dropped capabilities
/// - Read-only root filesystem
/// - Memory and CPU limits
///
/// The child is killed if the run is dropped, so stopping an executing job
/// ends its process.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    config: SandboxConfig,
}

impl ProcessEngine {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Full argument vector (program first) of the interpreter process.
    pub fn command_line(&self) -> Result<Vec<String>, ExecutionError> {
        if self.config.interpreter.is_empty() {
            return Err(ExecutionError::new("no interpreter configured"));
        }

        let mut args = Vec::new();

        if let Some(ref image) = self.config.docker_image {
            args.push("docker".to_string());
            args.push("run".to_string());
            args.push("--rm".to_string());
            // Keep stdin attached so the script reaches the interpreter
            args.push("--interactive".to_string());

            if self.config.network_disabled {
                args.push("--network=none".to_string());
            }
            if let Some(ref limit) = self.config.memory_limit {
                args.push(format!("--memory={}", limit));
            }
            if let Some(ref limit) = self.config.cpu_limit {
                args.push(format!("--cpus={}", limit));
            }

            args.push("--cap-drop=ALL".to_string());
            args.push("--security-opt=no-new-privileges".to_string());
            args.push("--read-only".to_string());
            args.push(image.clone());
        }

        args.extend(self.config.interpreter.iter().cloned());
        Ok(args)
    }
}

#[async_trait]
impl ScriptEngine for ProcessEngine {
    async fn execute(
        &self,
        script: &str,
        out: &mut OutputSink,
        err: &mut OutputSink,
    ) -> Result<(), ExecutionError> {
        let args = self.command_line()?;
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| ExecutionError::new("empty command line"))?;

        tracing::debug!(
            program = %program,
            script_bytes = script.len(),
            sandboxed = self.config.docker_image.is_some(),
            "Spawning script process"
        );

        let mut child = Command::new(program)
            .args(rest)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::new(format!("failed to start {}: {}", program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExecutionError::new("interpreter stdin unavailable"))?;

        // Feed stdin while draining stdout/stderr so neither side can stall the other
        let feed = async move {
            let written = stdin.write_all(script.as_bytes()).await;
            drop(stdin);
            written
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());
        let output = output
            .map_err(|e| ExecutionError::new(format!("failed to run {}: {}", program, e)))?;
        if let Err(e) = written {
            // A script may exit before consuming all of its input
            tracing::debug!(error = %e, "Interpreter closed stdin early");
        }

        out.write_all(&output.stdout)
            .map_err(|e| ExecutionError::new(e.to_string()))?;
        err.write_all(&output.stderr)
            .map_err(|e| ExecutionError::new(e.to_string()))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        let message = if !stderr.is_empty() {
            stderr
        } else {
            match output.status.code() {
                Some(code) => format!("exit code: {}", code),
                None => "terminated by signal".to_string(),
            }
        };
        Err(ExecutionError::new(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_command_line() {
        let engine = ProcessEngine::new(SandboxConfig::default());
        let args = engine.command_line().unwrap();
        assert_eq!(args, vec!["sh"]);
    }

    #[test]
    fn docker_command_line_carries_sandbox_flags() {
        let engine = ProcessEngine::new(SandboxConfig {
            docker_image: Some("alpine:latest".to_string()),
            ..SandboxConfig::default()
        });
        let args = engine.command_line().unwrap();

        assert_eq!(&args[..4], &["docker", "run", "--rm", "--interactive"]);
        assert!(args.contains(&"--network=none".to_string()));
        assert!(args.contains(&"--memory=256m".to_string()));
        assert!(args.contains(&"--cpus=0.5".to_string()));
        assert!(args.contains(&"--cap-drop=ALL".to_string()));
        assert!(args.contains(&"--read-only".to_string()));
        assert_eq!(&args[args.len() - 2..], &["alpine:latest", "sh"]);
    }

    #[test]
    fn network_flag_omitted_when_allowed() {
        let engine = ProcessEngine::new(SandboxConfig {
            docker_image: Some("alpine:latest".to_string()),
            network_disabled: false,
            ..SandboxConfig::default()
        });
        let args = engine.command_line().unwrap();
        assert!(!args.contains(&"--network=none".to_string()));
    }

    #[test]
    fn empty_interpreter_is_rejected() {
        let engine = ProcessEngine::new(SandboxConfig {
            interpreter: Vec::new(),
            ..SandboxConfig::default()
        });
        assert!(engine.command_line().is_err());
    }
}

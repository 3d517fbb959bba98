use std::io;

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a script engine. Kept on the job record, never returned to submitters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// In-memory capture buffer handed to an engine for one run.
#[derive(Debug, Default)]
pub struct OutputSink {
    buf: Vec<u8>,
}

impl OutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Captured bytes as text; invalid UTF-8 is replaced.
    pub fn into_string(self) -> String {
        match String::from_utf8(self.buf) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

impl io::Write for OutputSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Capability that actually runs script text.
///
/// The scheduler treats scripts as opaque: it hands the body over together
/// with fresh `out`/`err` sinks and only looks at whether the call succeeded.
/// An engine future may be dropped part way through when its job is stopped.
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    async fn execute(
        &self,
        script: &str,
        out: &mut OutputSink,
        err: &mut OutputSink,
    ) -> Result<(), ExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sink_collects_writes() {
        let mut sink = OutputSink::new();
        assert!(sink.is_empty());
        write!(sink, "hello ").unwrap();
        sink.write_all(b"world").unwrap();
        assert_eq!(sink.as_bytes(), b"hello world");
        assert_eq!(sink.into_string(), "hello world");
    }

    #[test]
    fn sink_replaces_invalid_utf8() {
        let mut sink = OutputSink::new();
        sink.write_all(&[b'o', b'k', 0xff]).unwrap();
        assert_eq!(sink.into_string(), "ok\u{fffd}");
    }

    #[test]
    fn execution_error_displays_message() {
        let err = ExecutionError::new("ReferenceError: x is not defined");
        assert_eq!(err.to_string(), "ReferenceError: x is not defined");
    }
}

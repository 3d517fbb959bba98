use std::net::SocketAddr;

/// Maximum number of scripts executing at the same time.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Configuration for the process-backed script engine.
///
/// Scripts run through `interpreter` (the script body is appended as the
/// last argument). When `docker_image` is set the interpreter runs inside a
/// sandboxed container instead of on the host.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Interpreter program and leading arguments, e.g. `["sh"]`; it reads the script from stdin
    pub interpreter: Vec<String>,
    /// Docker image to run scripts in; `None` runs them locally
    pub docker_image: Option<String>,
    /// Disable network access in container
    pub network_disabled: bool,
    /// Memory limit (e.g., "256m")
    pub memory_limit: Option<String>,
    /// CPU limit (e.g., "0.5" for half a CPU)
    pub cpu_limit: Option<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: vec!["sh".to_string()],
            docker_image: None,
            network_disabled: true,
            memory_limit: Some("256m".to_string()),
            cpu_limit: Some("0.5".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Worker pool size. Pending work beyond this waits in an unbounded queue.
    pub pool_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub listen_addr: SocketAddr,
    pub scheduler: SchedulerConfig,
    pub sandbox: SandboxConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            scheduler: SchedulerConfig::default(),
            sandbox: SandboxConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.scheduler.pool_size = pool_size;
        self
    }

    pub fn with_sandbox(mut self, sandbox: SandboxConfig) -> Self {
        self.sandbox = sandbox;
        self
    }
}

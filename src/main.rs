use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use scriptbox::config::{NodeConfig, SandboxConfig, SchedulerConfig, DEFAULT_POOL_SIZE};
use scriptbox::node::Node;
use scriptbox::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "scriptbox")]
#[command(version)]
#[command(about = "Run scripts now or later, and track them until they finish")]
struct Args {
    /// Port to listen on for HTTP
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Number of scripts allowed to execute at the same time
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE)]
    workers: usize,

    /// Interpreter command; the script body is written to its stdin
    #[arg(long, default_value = "sh")]
    interpreter: String,

    // === Sandbox Options ===
    /// Run every script inside this Docker image
    #[arg(long)]
    docker_image: Option<String>,

    /// Container memory limit (e.g. "256m")
    #[arg(long, default_value = "256m")]
    memory_limit: String,

    /// Container CPU limit (e.g. "0.5")
    #[arg(long, default_value = "0.5")]
    cpu_limit: String,

    /// Give containers network access
    #[arg(long)]
    allow_network: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let interpreter: Vec<String> = args
        .interpreter
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if interpreter.is_empty() {
        return Err("--interpreter must not be empty".into());
    }
    if args.workers == 0 {
        return Err("--workers must be at least 1".into());
    }

    let listen_addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;

    let config = NodeConfig {
        listen_addr,
        scheduler: SchedulerConfig {
            pool_size: args.workers,
        },
        sandbox: SandboxConfig {
            interpreter,
            docker_image: args.docker_image,
            network_disabled: !args.allow_network,
            memory_limit: Some(args.memory_limit),
            cpu_limit: Some(args.cpu_limit),
        },
    };

    tracing::info!(
        listen_addr = %config.listen_addr,
        workers = config.scheduler.pool_size,
        interpreter = ?config.sandbox.interpreter,
        docker_image = ?config.sandbox.docker_image,
        "Starting scriptbox"
    );

    let node = Node::new(config);
    let shutdown = install_shutdown_handler(node.scheduler.clone());
    node.run(shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

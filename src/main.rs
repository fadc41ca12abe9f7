//! cc-proxy exposes the Claude Code CLI as an OpenAI-compatible HTTP
//! inference endpoint. Each incoming request spawns an isolated claude
//! subprocess; the proxy itself is fully stateless.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cc_proxy::chat::{Client, ClientConfig};
use cc_proxy::server::{Server, ServerConfig};

/// Name of the environment variable consulted when --api-key is not given.
const API_KEY_ENV: &str = "CC_PROXY_API_KEY";

#[derive(Parser, Debug)]
#[command(name = "cc-proxy")]
#[command(about = "OpenAI-compatible HTTP endpoint backed by the Claude Code CLI")]
#[command(version)]
struct Args {
    /// Listen address for the HTTP server
    #[arg(long, default_value = ":8080")]
    addr: String,

    /// Default model (e.g. sonnet, opus, haiku); per-request model wins
    #[arg(long, default_value = "")]
    model: String,

    /// Bearer token for incoming requests; empty disables auth.
    /// Falls back to CC_PROXY_API_KEY when not given.
    #[arg(long, default_value = "")]
    api_key: String,

    /// Path to the claude CLI binary
    #[arg(long, default_value = "claude")]
    claude_path: String,

    /// Max concurrent claude subprocesses (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_concurrent: usize,

    /// Per-request timeout in seconds (0 disables)
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Working directory for claude subprocesses
    #[arg(long)]
    work_dir: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // The flag wins over the environment.
    if args.api_key.is_empty() {
        args.api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
    }

    // Accept the Go-style ":8080" shorthand for all interfaces.
    let addr = if args.addr.starts_with(':') {
        format!("0.0.0.0{}", args.addr)
    } else {
        args.addr.clone()
    };

    let client = Arc::new(Client::new(ClientConfig {
        cli_path: args.claude_path.clone(),
        model: args.model.clone(),
        max_concurrent: args.max_concurrent,
        default_timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        work_dir: args.work_dir.clone(),
    }));

    eprintln!("cc-proxy starting on {addr}");
    if !args.model.is_empty() {
        eprintln!("default model: {}", args.model);
    }
    if args.api_key.is_empty() {
        eprintln!("auth: disabled");
    } else {
        eprintln!("auth: enabled");
    }
    if args.max_concurrent > 0 {
        eprintln!("max concurrent: {}", args.max_concurrent);
    }

    let server = Server::new(
        ServerConfig {
            addr,
            api_key: args.api_key,
        },
        client,
    );

    server.serve().await?;
    Ok(())
}

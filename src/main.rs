//! Platform MCP Server - resource lifecycle tools over stdio.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use platform_mcp::{PlatformConfig, PlatformMcpServer, ResourceOrchestrator};

/// Platform MCP Server - create, inspect and delete platform resources.
#[derive(Parser, Debug)]
#[command(name = "platform-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "PLATFORM_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON.
    #[arg(long, default_value = "false")]
    json_logs: bool,

    #[command(flatten)]
    platform: PlatformConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries the protocol, logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    args.platform.validate()?;

    info!("Platform MCP Server starting");
    info!(
        api_url = %args.platform.api_url,
        workspace = %args.platform.workspace,
        "Using platform workspace"
    );

    let orchestrator = ResourceOrchestrator::from_config(&args.platform)?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down"),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
        signal_token.cancel();
    });

    let mut server = PlatformMcpServer::new(orchestrator, shutdown);
    server.run_stdio().await?;

    Ok(())
}

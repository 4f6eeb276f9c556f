//! linecmd - a single-session line command server
//!
//! This is the main entry point for the server binary.
//! It loads configuration, sets up logging and runs the accept loop until a
//! client sends `stop` or the process receives Ctrl+C.

use linecmd::commands::CommandHandler;
use linecmd::connection::ConnectionStats;
use linecmd::{Config, Server};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // RUST_LOG wins over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        version = linecmd::VERSION,
        address = %config.bind_address(),
        backlog = config.backlog,
        chunk_size = config.chunk_size,
        io_timeout = ?config.io_timeout,
        "Starting linecmd server"
    );

    let stats = Arc::new(ConnectionStats::new());
    let handler = CommandHandler::new(config.handler_config(), Arc::clone(&stats));
    let server = Server::bind(&config, handler, Arc::clone(&stats)).await?;

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    server.run_until(shutdown).await?;

    info!(
        sessions = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        failed = stats.sessions_failed.load(Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}

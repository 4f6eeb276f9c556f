//! # linecmd - A Single-Session Line Command Server
//!
//! linecmd is a small TCP server framework built around a newline-delimited
//! text protocol. It serves exactly one client at a time: a connection is
//! accepted, greeted, and handled to completion before the next one is
//! accepted.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                              linecmd                                │
//! │                                                                     │
//! │  ┌─────────────┐  accept   ┌─────────────────┐                      │
//! │  │   Server    │──────────>│  Connection<S>  │                      │
//! │  │ (listener)  │           └────────┬────────┘                      │
//! │  └──────▲──────┘                    │ handle() until Flow::Close    │
//! │         │                           ▼                               │
//! │         │              ┌─────────────────────────┐                  │
//! │         │              │ impl ConnectionHandler  │                  │
//! │         │              │   (CommandHandler)      │                  │
//! │         │              └────────────┬────────────┘                  │
//! │         │                           │                               │
//! │         │                           ▼                               │
//! │         │              ┌─────────────────────────┐                  │
//! │         │              │     CommandFramer       │                  │
//! │         │              │ per-connection buffers  │                  │
//! │         │              └─────────────────────────┘                  │
//! │         │                                                           │
//! │         └──────────── StopSignal (set by `stop`) ───────────────────│
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use linecmd::commands::CommandHandler;
//! use linecmd::connection::ConnectionStats;
//! use linecmd::{Config, Server};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let stats = Arc::new(ConnectionStats::new());
//!     let handler = CommandHandler::new(config.handler_config(), Arc::clone(&stats));
//!
//!     let server = Server::bind(&config, handler, stats).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol
//!
//! - On accept the server sends `WELCOME\n`
//! - `exit` - farewell, the session ends, the server keeps listening
//! - `stop` - shutdown notice, the session ends, the server stops listening
//! - anything else - `Ignoring command '<line>'.\n`, the session continues
//!
//! ## Module Overview
//!
//! - [`protocol`]: Line framing and the command vocabulary
//! - [`connection`]: Connections, the handler contract and the stop signal
//! - [`commands`]: The stock command handler
//! - [`server`]: The accept loop
//! - [`config`]: CLI and TOML configuration
//! - [`error`]: Server and session error types

pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod server;

// Re-export commonly used types for convenience
pub use commands::{CommandHandler, HandlerConfig};
pub use config::{Config, ConfigError};
pub use connection::{
    Connection, ConnectionHandler, ConnectionId, ConnectionStats, Flow, StopSignal,
};
pub use error::{ServerError, SessionError};
pub use protocol::{Command, CommandFramer};
pub use server::Server;

/// The default port linecmd listens on
pub const DEFAULT_PORT: u16 = 1234;

/// The default host linecmd binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of linecmd
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

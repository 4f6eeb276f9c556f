//! Connection Module
//!
//! This module defines what a session looks like from the server's side:
//! the accepted transport, the contract every protocol handler satisfies,
//! and the counters shared across sessions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Server (server.rs)                      │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept(), one at a time
//!                        ▼
//!           ┌────────────────────────┐
//!           │   Connection<S>        │
//!           │   (id, peer, stream)   │
//!           └────────────┬───────────┘
//!                        │
//!                        │ handle() until Flow::Close
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              impl ConnectionHandler                         │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read bytes  │───>│ Frame line  │───>│ Respond     │     │
//! │  └─────────────┘    └─────────────┘    └─────────────┘     │
//! │                                                             │
//! │                 StopSignal ───> read by Server              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod handler;
pub mod stats;
mod stream;

// Re-export commonly used types
pub use handler::{ConnectionHandler, Flow, StopSignal};
pub use stats::ConnectionStats;
pub use stream::{Connection, ConnectionId};

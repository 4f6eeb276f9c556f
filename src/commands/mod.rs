//! Command Handler Module
//!
//! This module implements the protocol layer on top of the framer: it reads
//! lines, interprets them and writes the responses.
//!
//! ## Architecture
//!
//! ```text
//! Client bytes
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ CommandFramer   │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - exit         │
//! │  - stop         │
//! │  - ignore       │
//! └────────┬────────┘
//!          │
//!          ▼
//!    Flow + StopSignal ──> Server
//! ```

pub mod handler;

// Re-export the main command handler
pub use handler::CommandHandler;

/// Default number of bytes per receive attempt (one byte is kept in reserve).
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Default limit for unterminated input held per connection (64 KB).
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Tuning for [`CommandHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Size of the read chunk; each receive asks for `chunk_size - 1` bytes.
    pub chunk_size: usize,
    /// A connection whose unterminated input reaches this size is closed.
    pub max_buffer_size: usize,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

impl HandlerConfig {
    /// Bytes requested per receive.
    pub(crate) fn read_len(&self) -> usize {
        self.chunk_size.saturating_sub(1).max(1)
    }
}

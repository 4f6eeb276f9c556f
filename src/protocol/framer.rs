//! Newline Command Framer
//!
//! TCP is a stream protocol: a single read may carry half a command, or
//! several commands at once. The framer accumulates raw bytes per connection
//! and hands them back one complete line at a time.
//!
//! ## How Framing Works
//!
//! ```text
//!   add_data(#1, "pi")        buffer #1: "pi"
//!   add_data(#1, "ng\nex")    buffer #1: "ping\nex"
//!   get_command(#1)  ──────>  Some("ping")     buffer #1: "ex"
//!   get_command(#1)  ──────>  None             buffer #1: "ex"
//!   add_data(#1, "it\n")      buffer #1: "exit\n"
//!   get_command(#1)  ──────>  Some("exit")     buffer #1: ""
//! ```
//!
//! The buffer for a connection only ever holds the residue after the last
//! extracted command. Commands come out in arrival order no matter how the
//! bytes were split across reads.

use crate::connection::ConnectionId;
use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use tracing::trace;

/// The byte that terminates a command.
pub const DELIMITER: u8 = b'\n';

/// Reassembles newline-delimited commands from per-connection byte streams.
///
/// The buffers are private: the only way to mutate them is through
/// [`add_data`](Self::add_data), [`get_command`](Self::get_command) and
/// [`clear`](Self::clear), so no other component can corrupt a partially
/// received command.
///
/// # Example
///
/// ```
/// use linecmd::connection::ConnectionId;
/// use linecmd::protocol::CommandFramer;
///
/// let mut framer = CommandFramer::new();
/// let id = ConnectionId::new(1);
///
/// framer.add_data(id, b"ping\nsto");
/// assert_eq!(framer.get_command(id).as_deref(), Some(&b"ping"[..]));
/// assert_eq!(framer.get_command(id), None);
/// ```
#[derive(Debug, Default)]
pub struct CommandFramer {
    buffers: HashMap<ConnectionId, BytesMut>,
}

impl CommandFramer {
    /// Creates a framer with no buffered data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `data` to the buffer of `id`, creating the buffer if needed.
    ///
    /// Empty input is a no-op and does not create a buffer.
    pub fn add_data(&mut self, id: ConnectionId, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let buffer = self.buffers.entry(id).or_default();
        buffer.extend_from_slice(data);
        trace!(conn = %id, added = data.len(), buffered = buffer.len(), "Buffered data");
    }

    /// Extracts the next complete command for `id`.
    ///
    /// Returns the bytes before the first delimiter and drops them, together
    /// with the delimiter, from the buffer. Returns `None` when no delimiter
    /// has arrived yet; the buffer is left untouched in that case.
    ///
    /// An empty line yields `Some` of an empty command, which is distinct
    /// from `None`.
    pub fn get_command(&mut self, id: ConnectionId) -> Option<Bytes> {
        let buffer = self.buffers.get_mut(&id)?;
        let pos = buffer.iter().position(|&b| b == DELIMITER)?;

        let mut line = buffer.split_to(pos + 1);
        line.truncate(pos);

        trace!(conn = %id, len = pos, remaining = buffer.len(), "Extracted command");
        Some(line.freeze())
    }

    /// Discards everything buffered for `id`.
    ///
    /// Calling this for a connection without a buffer has no effect.
    pub fn clear(&mut self, id: ConnectionId) {
        if let Some(buffer) = self.buffers.remove(&id) {
            trace!(conn = %id, discarded = buffer.len(), "Cleared buffer");
        }
    }

    /// Returns true if a complete command is waiting for `id`.
    pub fn has_command(&self, id: ConnectionId) -> bool {
        self.buffers
            .get(&id)
            .is_some_and(|buffer| buffer.contains(&DELIMITER))
    }

    /// Number of bytes buffered for `id` that have not been extracted yet.
    pub fn buffered_len(&self, id: ConnectionId) -> usize {
        self.buffers.get(&id).map_or(0, BytesMut::len)
    }

    /// Number of connections that currently have a buffer.
    pub fn connections(&self) -> usize {
        self.buffers.len()
    }
}

//! Error types for linecmd.
//!
//! Errors are split by scope:
//!
//! - [`ServerError`]: setup and accept failures. These are fatal to the
//!   server and propagate out of [`Server::bind`](crate::Server::bind) and
//!   [`Server::run`](crate::Server::run).
//! - [`SessionError`]: I/O problems on one connection. They end that
//!   session and never reach the accept loop.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured host and port do not resolve to a socket address
    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),

    /// Creating the listening socket failed
    #[error("could not create socket: {0}")]
    Socket(#[source] io::Error),

    /// Binding the socket to the listen address failed
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Putting the socket into listening mode failed
    #[error("failed to listen: {0}")]
    Listen(#[source] io::Error),

    /// Accepting a connection failed
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),
}

/// Errors that end a single session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O error on the connection
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The peer did not make progress within the configured deadline
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The peer sent too much data without a line terminator
    #[error("buffer size limit exceeded: {size} bytes (max: {max})")]
    BufferFull { size: usize, max: usize },
}

impl SessionError {
    /// Returns true if the peer simply went away.
    ///
    /// These are logged at `debug` rather than `warn`.
    pub fn is_disconnect(&self) -> bool {
        match self {
            SessionError::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

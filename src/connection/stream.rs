//! Accepted connections and their identifiers.

use crate::error::SessionError;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Opaque handle identifying one accepted connection.
///
/// Assigned by the server on accept and valid for the duration of a single
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One client session's transport.
///
/// Generic over the stream so handlers can be exercised against in-memory
/// mocks as well as `TcpStream`.
#[derive(Debug)]
pub struct Connection<S> {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    stream: S,
    io_timeout: Option<Duration>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(id: ConnectionId, stream: S) -> Self {
        Self {
            id,
            peer: None,
            stream,
            io_timeout: None,
        }
    }

    /// Records the client's address (for logging).
    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Bounds every receive and send by `timeout`.
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Receives at most `buf.len()` bytes.
    ///
    /// `Ok(0)` means the peer closed its sending side.
    pub async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, SessionError> {
        let n = with_deadline(self.io_timeout, self.stream.read(buf)).await?;
        trace!(conn = %self.id, bytes = n, "Read data");
        Ok(n)
    }

    /// Writes all of `data` and flushes it.
    pub async fn send(&mut self, data: &[u8]) -> Result<(), SessionError> {
        let stream = &mut self.stream;
        with_deadline(self.io_timeout, async move {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await?;
        trace!(conn = %self.id, bytes = data.len(), "Sent data");
        Ok(())
    }

    /// Shuts down the write half so the peer sees end of stream.
    pub async fn shutdown(&mut self) -> Result<(), SessionError> {
        with_deadline(self.io_timeout, self.stream.shutdown()).await
    }

    /// Consumes the connection, returning the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

async fn with_deadline<T, F>(deadline: Option<Duration>, io: F) -> Result<T, SessionError>
where
    F: Future<Output = std::io::Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, io)
            .await
            .map_err(|_| SessionError::Timeout(limit))?
            .map_err(SessionError::from),
        None => io.await.map_err(SessionError::from),
    }
}

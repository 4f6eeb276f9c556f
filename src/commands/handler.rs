//! Command Handler
//!
//! Reads bytes from a connection, frames them into lines with the
//! [`CommandFramer`], and answers each line.
//!
//! ## One Round of `handle`
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Read phase                                   │
//! │   while no complete line is buffered:        │
//! │     recv(chunk_size - 1) ──> framer.add_data │
//! │     0 bytes => peer closed, stop reading     │
//! └──────────────────────┬───────────────────────┘
//!                        ▼
//!               framer.get_command()
//!                        │
//!        ┌───────────────┼────────────────┐
//!        ▼               ▼                ▼
//!      None            exit/stop        other
//!   (peer closed)   farewell/notice   "Ignoring ..."
//!    Flow::Close      Flow::Close     Flow::Continue
//! ```
//!
//! The read phase stops as soon as one complete line is available instead of
//! waiting for the peer to close, so every flushed line gets its response
//! right away. Lines that arrived together stay in the framer and are
//! answered by the following calls, in order.

use crate::commands::HandlerConfig;
use crate::connection::{
    Connection, ConnectionHandler, ConnectionId, ConnectionStats, Flow, StopSignal,
};
use crate::error::SessionError;
use crate::protocol::{Command, CommandFramer};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

/// The stock handler: `exit`, `stop`, and "ignoring" for everything else.
#[derive(Debug)]
pub struct CommandHandler {
    framer: CommandFramer,
    config: HandlerConfig,
    stop: StopSignal,
    stats: Arc<ConnectionStats>,
}

impl CommandHandler {
    /// Creates a handler with its own framer and stop signal.
    pub fn new(config: HandlerConfig, stats: Arc<ConnectionStats>) -> Self {
        Self {
            framer: CommandFramer::new(),
            config,
            stop: StopSignal::new(),
            stats,
        }
    }

    /// Bytes buffered for a connection but not yet framed into a command.
    pub fn buffered_len(&self, id: ConnectionId) -> usize {
        self.framer.buffered_len(id)
    }

    /// Fills the framer until a complete line is buffered.
    ///
    /// Returns `Ok(false)` if the peer closed the connection first.
    async fn fill<S>(&mut self, conn: &mut Connection<S>) -> Result<bool, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let id = conn.id();
        let mut chunk = vec![0u8; self.config.read_len()];

        while !self.framer.has_command(id) {
            let n = conn.recv(&mut chunk).await?;
            if n == 0 {
                return Ok(false);
            }

            self.stats.bytes_read(n);
            self.framer.add_data(id, &chunk[..n]);

            let size = self.framer.buffered_len(id);
            if size >= self.config.max_buffer_size && !self.framer.has_command(id) {
                return Err(SessionError::BufferFull {
                    size,
                    max: self.config.max_buffer_size,
                });
            }
        }

        Ok(true)
    }

    /// Reads until a command is available and extracts it.
    ///
    /// `Ok(None)` means the peer closed without sending another full line.
    async fn read_line<S>(
        &mut self,
        conn: &mut Connection<S>,
    ) -> Result<Option<Bytes>, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let open = self.fill(conn).await?;
        let line = self.framer.get_command(conn.id());
        if !open && line.is_none() {
            let dropped = self.framer.buffered_len(conn.id());
            debug!(conn = %conn.id(), dropped, "Peer closed the connection");
        }
        Ok(line)
    }

    /// Runs one command and writes its response.
    async fn execute<S>(
        &mut self,
        conn: &mut Connection<S>,
        command: Command,
    ) -> Result<Flow, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let response = command.response();
        conn.send(&response).await?;
        self.stats.bytes_written(response.len());

        match command {
            Command::Exit => {
                self.framer.clear(conn.id());
                info!(conn = %conn.id(), "Client said goodbye");
                Ok(Flow::Close)
            }
            Command::Stop => {
                self.framer.clear(conn.id());
                self.stop.request_stop();
                info!(conn = %conn.id(), "Stop requested by client");
                Ok(Flow::Close)
            }
            Command::Unknown(_) => Ok(Flow::Continue),
        }
    }

    async fn round<S>(&mut self, conn: &mut Connection<S>) -> Result<Flow, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let Some(line) = self.read_line(conn).await? else {
            self.framer.clear(conn.id());
            return Ok(Flow::Close);
        };

        let command = Command::parse(line);
        debug!(conn = %conn.id(), %command, "Command received");
        self.stats.command_processed();

        self.execute(conn, command).await
    }
}

#[async_trait]
impl ConnectionHandler for CommandHandler {
    async fn handle<S>(&mut self, conn: &mut Connection<S>) -> Flow
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        match self.round(conn).await {
            Ok(flow) => flow,
            Err(e) => {
                if e.is_disconnect() {
                    debug!(conn = %conn.id(), error = %e, "Connection dropped by client");
                } else {
                    warn!(conn = %conn.id(), error = %e, "Session I/O failed");
                }
                self.stats.session_failed();
                self.framer.clear(conn.id());
                Flow::Close
            }
        }
    }

    fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio_test::io::Builder;

    fn handler() -> CommandHandler {
        CommandHandler::new(HandlerConfig::default(), Arc::new(ConnectionStats::new()))
    }

    fn mock_conn(mock: tokio_test::io::Mock) -> Connection<tokio_test::io::Mock> {
        Connection::new(ConnectionId::new(1), mock)
    }

    #[tokio::test]
    async fn test_ping_is_ignored() {
        let mock = Builder::new()
            .read(b"ping\n")
            .write(b"Ignoring command 'ping'.\n")
            .build();
        let mut conn = mock_conn(mock);
        let mut handler = handler();

        assert_eq!(handler.handle(&mut conn).await, Flow::Continue);
        assert!(!handler.stop_signal().is_stop_requested());
    }

    #[tokio::test]
    async fn test_empty_line_is_ignored() {
        let mock = Builder::new()
            .read(b"\n")
            .write(b"Ignoring command ''.\n")
            .build();
        let mut conn = mock_conn(mock);

        assert_eq!(handler().handle(&mut conn).await, Flow::Continue);
    }

    #[tokio::test]
    async fn test_exit_closes_session() {
        let mock = Builder::new()
            .read(b"exit\n")
            .write(b"Thank You Very Much.\nBye.\n")
            .build();
        let mut conn = mock_conn(mock);
        let mut handler = handler();

        assert_eq!(handler.handle(&mut conn).await, Flow::Close);
        assert!(!handler.stop_signal().is_stop_requested());
        assert_eq!(handler.buffered_len(conn.id()), 0);
    }

    #[tokio::test]
    async fn test_stop_sets_signal() {
        let mock = Builder::new()
            .read(b"stop\n")
            .write(b"Server exiting.\n")
            .build();
        let mut conn = mock_conn(mock);
        let mut handler = handler();
        let signal = handler.stop_signal();

        assert_eq!(handler.handle(&mut conn).await, Flow::Close);
        assert!(signal.is_stop_requested());
    }

    #[tokio::test]
    async fn test_command_split_across_reads() {
        let mock = Builder::new()
            .read(b"pi")
            .read(b"n")
            .read(b"g\n")
            .write(b"Ignoring command 'ping'.\n")
            .build();
        let mut conn = mock_conn(mock);

        assert_eq!(handler().handle(&mut conn).await, Flow::Continue);
    }

    #[tokio::test]
    async fn test_pipelined_commands_answered_in_order() {
        let mock = Builder::new()
            .read(b"a\nb\nexit\ntrailing")
            .write(b"Ignoring command 'a'.\n")
            .write(b"Ignoring command 'b'.\n")
            .write(b"Thank You Very Much.\nBye.\n")
            .build();
        let mut conn = mock_conn(mock);
        let mut handler = handler();

        assert_eq!(handler.handle(&mut conn).await, Flow::Continue);
        assert_eq!(handler.handle(&mut conn).await, Flow::Continue);
        assert_eq!(handler.handle(&mut conn).await, Flow::Close);
        assert_eq!(handler.buffered_len(conn.id()), 0);
    }

    #[tokio::test]
    async fn test_peer_close_ends_session() {
        let mock = Builder::new().read(b"no newline").build();
        let mut conn = mock_conn(mock);
        let mut handler = handler();

        assert_eq!(handler.handle(&mut conn).await, Flow::Close);
        assert_eq!(handler.buffered_len(conn.id()), 0);
    }

    #[tokio::test]
    async fn test_last_line_answered_after_peer_close() {
        let mock = Builder::new()
            .read(b"hello\n")
            .write(b"Ignoring command 'hello'.\n")
            .build();
        let mut conn = mock_conn(mock);
        let mut handler = handler();

        assert_eq!(handler.handle(&mut conn).await, Flow::Continue);
        assert_eq!(handler.handle(&mut conn).await, Flow::Close);
    }

    #[tokio::test]
    async fn test_read_error_ends_session() {
        let stats = Arc::new(ConnectionStats::new());
        let mock = Builder::new()
            .read(b"par")
            .read_error(std::io::Error::other("boom"))
            .build();
        let mut conn = mock_conn(mock);
        let mut handler = CommandHandler::new(HandlerConfig::default(), Arc::clone(&stats));

        assert_eq!(handler.handle(&mut conn).await, Flow::Close);
        assert_eq!(handler.buffered_len(conn.id()), 0);
        assert_eq!(stats.sessions_failed.load(Ordering::Relaxed), 1);
        assert!(!handler.stop_signal().is_stop_requested());
    }

    #[tokio::test]
    async fn test_write_error_ends_session() {
        let mock = Builder::new()
            .read(b"ping\n")
            .write_error(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            .build();
        let mut conn = mock_conn(mock);

        assert_eq!(handler().handle(&mut conn).await, Flow::Close);
    }

    #[tokio::test]
    async fn test_reads_respect_chunk_size() {
        // chunk_size 4 => at most 3 bytes per receive
        let config = HandlerConfig {
            chunk_size: 4,
            ..HandlerConfig::default()
        };
        let mock = Builder::new()
            .read(b"abc")
            .read(b"de\n")
            .write(b"Ignoring command 'abcde'.\n")
            .build();
        let mut conn = mock_conn(mock);
        let mut handler = CommandHandler::new(config, Arc::new(ConnectionStats::new()));

        assert_eq!(handler.handle(&mut conn).await, Flow::Continue);
    }

    #[tokio::test]
    async fn test_buffer_limit_ends_session() {
        let config = HandlerConfig {
            chunk_size: 64,
            max_buffer_size: 8,
            ..HandlerConfig::default()
        };
        let stats = Arc::new(ConnectionStats::new());
        let mock = Builder::new().read(b"0123456789").build();
        let mut conn = mock_conn(mock);
        let mut handler = CommandHandler::new(config, Arc::clone(&stats));

        assert_eq!(handler.handle(&mut conn).await, Flow::Close);
        assert_eq!(stats.sessions_failed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_io_timeout_ends_session() {
        let (_client, server) = tokio::io::duplex(64);
        let mut conn = Connection::new(ConnectionId::new(3), server)
            .with_io_timeout(Some(Duration::from_millis(20)));

        assert_eq!(handler().handle(&mut conn).await, Flow::Close);
    }

    #[tokio::test]
    async fn test_stats_are_updated() {
        let stats = Arc::new(ConnectionStats::new());
        let mock = Builder::new()
            .read(b"ping\n")
            .write(b"Ignoring command 'ping'.\n")
            .build();
        let mut conn = mock_conn(mock);
        let mut handler = CommandHandler::new(HandlerConfig::default(), Arc::clone(&stats));

        handler.handle(&mut conn).await;

        assert_eq!(stats.commands_processed.load(Ordering::Relaxed), 1);
        assert_eq!(stats.bytes_read.load(Ordering::Relaxed), 5);
        assert_eq!(stats.bytes_written.load(Ordering::Relaxed), 25);
    }
}

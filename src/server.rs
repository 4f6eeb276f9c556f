//! TCP server driving one session at a time.
//!
//! The server binds a listening socket, then alternates between two states:
//!
//! ```text
//!            accept() + greeting
//!   ┌──────┐ ───────────────────> ┌─────────┐
//!   │ Idle │                      │ Serving │ ──┐ handle() == Continue
//!   └──────┘ <─────────────────── └─────────┘ <─┘
//!      ▲      handle() == Close        │
//!      │      (stop not requested)     │ handle() == Close
//!      │                               │ (stop requested)
//!   listening                          ▼
//!                                  shut down
//! ```
//!
//! While a session is being served nobody calls `accept`, so other clients
//! wait in the listen backlog until the current session ends.

use crate::config::Config;
use crate::connection::{
    Connection, ConnectionHandler, ConnectionId, ConnectionStats, StopSignal,
};
use crate::error::ServerError;
use crate::protocol::GREETING;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{debug, error, info, warn};

/// Server instance
pub struct Server<H> {
    listener: TcpListener,
    local_addr: SocketAddr,
    handler: H,
    stop: StopSignal,
    stats: Arc<ConnectionStats>,
    io_timeout: Option<Duration>,
    next_id: u64,
}

impl<H: ConnectionHandler> Server<H> {
    /// Creates the listening socket.
    ///
    /// Address resolution, socket creation, bind and listen each fail with
    /// their own [`ServerError`] variant; nothing is retried.
    pub async fn bind(
        config: &Config,
        handler: H,
        stats: Arc<ConnectionStats>,
    ) -> Result<Self, ServerError> {
        let address = config.bind_address();
        let addr = tokio::net::lookup_host(&address)
            .await
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ServerError::InvalidAddress(address.clone()))?;

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        };
        let socket = socket.map_err(ServerError::Socket)?;

        // Same as TcpListener::bind: allow quick restarts on Unix
        #[cfg(not(windows))]
        socket.set_reuseaddr(true).map_err(ServerError::Socket)?;

        socket
            .bind(addr)
            .map_err(|source| ServerError::Bind { addr, source })?;
        let listener = socket.listen(config.backlog).map_err(ServerError::Listen)?;
        let local_addr = listener.local_addr().map_err(ServerError::Listen)?;

        debug!(address = %local_addr, backlog = config.backlog, "Socket bound");

        Ok(Server {
            listener,
            local_addr,
            stop: handler.stop_signal(),
            handler,
            stats,
            io_timeout: config.io_timeout,
            next_id: 0,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The stop signal shared with the handler.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn stats(&self) -> &Arc<ConnectionStats> {
        &self.stats
    }

    /// Accepts and serves connections until a session requests a stop.
    ///
    /// Returns an error only if `accept` fails. The listener is closed when
    /// this returns, so later connection attempts are refused.
    pub async fn run(mut self) -> Result<(), ServerError> {
        info!("Listening on {}", self.local_addr);

        while !self.stop.is_stop_requested() {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "Failed to accept");
                    return Err(ServerError::Accept(e));
                }
            };

            self.serve(stream, peer).await;
        }

        info!("Stopped listening on {}", self.local_addr);
        Ok(())
    }

    /// Like [`run`](Self::run), but also returns once `shutdown` completes.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let address = self.local_addr;
        tokio::select! {
            result = self.run() => result,
            _ = shutdown => {
                info!("Shutdown signal received, stopped listening on {}", address);
                Ok(())
            }
        }
    }

    fn next_connection_id(&mut self) -> ConnectionId {
        self.next_id += 1;
        ConnectionId::new(self.next_id)
    }

    /// Runs one session to completion.
    async fn serve(&mut self, stream: TcpStream, peer: SocketAddr) {
        let id = self.next_connection_id();
        let mut conn = Connection::new(id, stream)
            .with_peer(peer)
            .with_io_timeout(self.io_timeout);

        self.stats.connection_opened();
        info!(conn = %id, peer = %peer, "Handling client");

        match conn.send(GREETING).await {
            Ok(()) => {
                self.stats.bytes_written(GREETING.len());
                while self.handler.handle(&mut conn).await.is_continue() {}
            }
            Err(e) => {
                warn!(conn = %id, error = %e, "Failed to send greeting");
                self.stats.session_failed();
            }
        }

        if let Err(e) = conn.shutdown().await {
            debug!(conn = %id, error = %e, "Shutdown after session failed");
        }
        drop(conn);

        self.stats.connection_closed();
        info!(conn = %id, peer = %peer, "Client disconnected");
    }
}

//! Connection Handler Contract
//!
//! The server loop does not know what a protocol looks like. It only needs
//! something that can run one round of protocol work on a connection and say
//! whether to keep going, plus a way to learn that the server should stop.
//!
//! ## Session Lifecycle
//!
//! ```text
//! 1. Server accepts a connection, sends the greeting
//!        │
//!        ▼
//! 2. ┌──────────────────────────────┐
//!    │  handler.handle(&mut conn)   │◄──┐
//!    └──────────────┬───────────────┘   │
//!                   │                   │
//!          Flow::Continue ──────────────┘
//!                   │
//!             Flow::Close
//!                   │
//!                   ▼
//! 3. Server closes the connection
//!        │
//!        ▼
//! 4. stop_signal().is_stop_requested()?
//!        ├── no  ──> accept the next connection
//!        └── yes ──> stop listening
//! ```

use crate::connection::Connection;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// What the server loop should do after a call to
/// [`ConnectionHandler::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Call `handle` again for this connection.
    Continue,
    /// The session is over; close the connection.
    Close,
}

impl Flow {
    pub fn is_continue(self) -> bool {
        self == Flow::Continue
    }
}

impl From<Flow> for bool {
    fn from(flow: Flow) -> bool {
        flow.is_continue()
    }
}

/// Shared "stop requested" flag.
///
/// Clones observe the same flag. The handler sets it; the server reads it
/// once per completed session.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the server to stop once the current session ends.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Anything that can drive a session.
///
/// # Example
///
/// A handler that ends every session after one round:
///
/// ```
/// use async_trait::async_trait;
/// use linecmd::connection::{Connection, ConnectionHandler, Flow, StopSignal};
/// use tokio::io::{AsyncRead, AsyncWrite};
///
/// struct OneShot {
///     stop: StopSignal,
/// }
///
/// #[async_trait]
/// impl ConnectionHandler for OneShot {
///     async fn handle<S>(&mut self, _conn: &mut Connection<S>) -> Flow
///     where
///         S: AsyncRead + AsyncWrite + Unpin + Send,
///     {
///         Flow::Close
///     }
///
///     fn stop_signal(&self) -> StopSignal {
///         self.stop.clone()
///     }
/// }
/// ```
#[async_trait]
pub trait ConnectionHandler: Send {
    /// Performs one unit of protocol work: read input, interpret at most one
    /// command, write the response.
    ///
    /// Session-scoped failures must be turned into [`Flow::Close`] here;
    /// they never reach the server loop.
    async fn handle<S>(&mut self, conn: &mut Connection<S>) -> Flow
    where
        S: AsyncRead + AsyncWrite + Unpin + Send;

    /// The flag the server checks after each session.
    fn stop_signal(&self) -> StopSignal;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_signal_is_shared() {
        let signal = StopSignal::new();
        let observer = signal.clone();
        assert!(!observer.is_stop_requested());

        signal.request_stop();
        assert!(observer.is_stop_requested());
    }

    #[test]
    fn test_flow_as_bool() {
        assert!(bool::from(Flow::Continue));
        assert!(!bool::from(Flow::Close));
    }
}

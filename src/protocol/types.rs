//! Command and Response Types
//!
//! The protocol has two recognized commands and a catch-all:
//!
//! | Line   | Response                         | Session effect              |
//! |--------|----------------------------------|-----------------------------|
//! | `exit` | `Thank You Very Much.\nBye.\n`   | session ends                |
//! | `stop` | `Server exiting.\n`              | session ends, server stops  |
//! | other  | `Ignoring command '<line>'.\n`   | session continues           |
//!
//! Matching is exact and case-sensitive against the whole line, so `EXIT`
//! and `exit\r` are both ignored.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Sent as soon as a connection is accepted, before any input is read.
pub const GREETING: &[u8] = b"WELCOME\n";

/// Sent in reply to `exit`.
pub const FAREWELL: &[u8] = b"Thank You Very Much.\nBye.\n";

/// Sent in reply to `stop`.
pub const SHUTDOWN_NOTICE: &[u8] = b"Server exiting.\n";

const IGNORING_PREFIX: &[u8] = b"Ignoring command '";
const IGNORING_SUFFIX: &[u8] = b"'.\n";

/// A command extracted from one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// End this session; the server keeps listening.
    Exit,
    /// End this session and stop the server.
    Stop,
    /// Anything else, kept verbatim so it can be echoed back.
    Unknown(Bytes),
}

impl Command {
    /// Interprets a line (without its delimiter).
    pub fn parse(line: Bytes) -> Self {
        match &line[..] {
            b"exit" => Command::Exit,
            b"stop" => Command::Stop,
            _ => Command::Unknown(line),
        }
    }

    /// Returns true if this command ends the session.
    pub fn ends_session(&self) -> bool {
        matches!(self, Command::Exit | Command::Stop)
    }

    /// Builds the response to send back for this command.
    pub fn response(&self) -> Bytes {
        match self {
            Command::Exit => Bytes::from_static(FAREWELL),
            Command::Stop => Bytes::from_static(SHUTDOWN_NOTICE),
            Command::Unknown(line) => ignoring(line),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Exit => write!(f, "exit"),
            Command::Stop => write!(f, "stop"),
            Command::Unknown(line) => write!(f, "{}", String::from_utf8_lossy(line)),
        }
    }
}

/// Builds the "ignored" response, echoing the raw line back.
pub fn ignoring(line: &[u8]) -> Bytes {
    let mut response =
        BytesMut::with_capacity(IGNORING_PREFIX.len() + line.len() + IGNORING_SUFFIX.len());
    response.put_slice(IGNORING_PREFIX);
    response.put_slice(line);
    response.put_slice(IGNORING_SUFFIX);
    response.freeze()
}

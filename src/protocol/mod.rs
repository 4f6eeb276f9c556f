//! Line Protocol Implementation
//!
//! Clients send plain-text commands terminated by `\n`. There is no header,
//! no length prefix and no binary framing.
//!
//! ## Modules
//!
//! - `framer`: Reassembles complete lines from per-connection byte streams
//! - `types`: The `Command` enum and the fixed responses
//!
//! ## Example
//!
//! ```
//! use linecmd::connection::ConnectionId;
//! use linecmd::protocol::{Command, CommandFramer};
//!
//! let mut framer = CommandFramer::new();
//! let id = ConnectionId::new(1);
//! framer.add_data(id, b"ping\n");
//!
//! let command = Command::parse(framer.get_command(id).unwrap());
//! assert_eq!(&command.response()[..], b"Ignoring command 'ping'.\n");
//! ```

pub mod framer;
pub mod types;

// Re-export commonly used types for convenience
pub use framer::{CommandFramer, DELIMITER};
pub use types::{Command, FAREWELL, GREETING, SHUTDOWN_NOTICE};

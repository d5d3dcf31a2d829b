//! IRC chat transport.
//!
//! [`IrcTransport`] keeps one connection to an IRC server alive (TLS when
//! `ssl` is set), reconnecting with jittered exponential backoff, and
//! implements
//! [`ChatTransport`](filterwatch_interface::ChatTransport) for the relay.
//! Outbound lines are paced at one per `line_rate`; `PONG` replies skip
//! the queue.
//!
//! The protocol itself lives in two I/O-free layers:
//! - [`IrcMessage`] parses and formats single lines.
//! - [`Session`] turns inbound messages into
//!   [`TransportEvent`](filterwatch_interface::TransportEvent)s and protocol
//!   replies, and handles nickname collisions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod message;
mod session;
mod settings;
mod transport;

pub use message::IrcMessage;
pub use session::{Action, Session};
pub use settings::IrcSettings;
pub use transport::IrcTransport;

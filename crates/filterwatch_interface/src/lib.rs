//! Collaborator traits for the filterwatch relay engine.
//!
//! The relay engine never talks to a wiki or an IRC server directly. It is
//! handed a [`SourceConnector`] that produces one [`LogSource`] per wiki and a
//! [`ChatTransport`] for outbound chat, and it receives [`TransportEvent`]s
//! describing what happened on the chat network.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod events;
mod traits;

pub use events::{Presence, TransportEvent};
pub use traits::{ChatTransport, LogSource, SourceConnector};

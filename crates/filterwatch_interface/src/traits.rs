//! Trait definitions for data sources and chat transports.

use async_trait::async_trait;
use filterwatch_core::{ChannelName, LogEntry, Nick, SourceName};
use filterwatch_error::{SourceError, TransportError};
use std::sync::Arc;

/// One wiki's abuse log.
///
/// Implementations may block on network I/O; callers run them off the relay's
/// main loop.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// The wiki this source reads from.
    fn name(&self) -> &SourceName;

    /// Log in to the wiki.
    ///
    /// # Errors
    ///
    /// Returns `Authentication` if the credentials are rejected, `Transient`
    /// if the wiki could not be reached.
    async fn authenticate(&self, user: &str, secret: &str) -> Result<(), SourceError>;

    /// Fetch the most recent page of log entries, in whatever order the wiki
    /// returns them.
    ///
    /// # Errors
    ///
    /// Returns `Blocked` if the bot may not read this log anymore, and
    /// `Transient` for anything worth retrying on the next cycle.
    async fn fetch_recent(&self) -> Result<Vec<LogEntry>, SourceError>;
}

/// Factory for [`LogSource`]s, one per wiki.
pub trait SourceConnector: Send + Sync {
    /// Create a fresh (unauthenticated) source for `source`.
    ///
    /// # Errors
    ///
    /// Returns `Transient` if no client could be set up for the wiki.
    fn connect(&self, source: &SourceName) -> Result<Arc<dyn LogSource>, SourceError>;
}

/// Outbound side of the chat network.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Request to join a channel. Membership is confirmed later by
    /// [`TransportEvent::JoinedChannel`](crate::TransportEvent::JoinedChannel).
    async fn join(&self, channel: &ChannelName) -> Result<(), TransportError>;

    /// Leave a channel.
    async fn leave(&self, channel: &ChannelName) -> Result<(), TransportError>;

    /// Send a message to a channel or a nickname.
    async fn send(&self, target: &str, text: &str) -> Result<(), TransportError>;

    /// Change (or reclaim) our nickname.
    async fn set_identity(&self, nick: &Nick) -> Result<(), TransportError>;

    /// Announce departure and close the session.
    async fn quit(&self, message: &str) -> Result<(), TransportError>;

    /// Drop the session without waiting for the server.
    async fn disconnect(&self);

    /// The nickname we are currently known by.
    fn current_nick(&self) -> Nick;
}

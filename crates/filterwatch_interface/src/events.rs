//! Notifications delivered by a chat transport.

use filterwatch_core::{ChannelName, Hostmask};
use serde::{Deserialize, Serialize};

/// Whether a user arrived in or departed from a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum Presence {
    /// The user joined.
    Joined,
    /// The user parted or was kicked.
    Left,
}

/// Something that happened on the chat network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Registration with the server completed.
    Connected,
    /// The session ended, expectedly or not.
    ConnectionLost {
        /// Human-readable cause.
        reason: String,
    },
    /// We are now a member of `channel`.
    JoinedChannel(ChannelName),
    /// We are no longer a member of `channel` (part or kick).
    LeftChannel(ChannelName),
    /// Another user joined or left a channel we are in.
    UserPresence {
        /// The user's nickname.
        nick: String,
        /// Channel concerned.
        channel: ChannelName,
        /// Direction of the change.
        presence: Presence,
    },
    /// Everyone else in a channel we just joined.
    ChannelMembers {
        /// Channel concerned.
        channel: ChannelName,
        /// Nicknames, membership prefixes stripped.
        nicks: Vec<String>,
    },
    /// Another user disconnected from the network.
    UserQuit {
        /// The user's nickname.
        nick: String,
        /// Quit message.
        message: String,
    },
    /// A message addressed to a channel we are in, or to us privately.
    Line {
        /// Who sent it.
        sender: Hostmask,
        /// Channel name, or our nickname for private messages.
        target: String,
        /// Message body.
        text: String,
    },
}

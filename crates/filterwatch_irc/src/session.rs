//! Client-side protocol state of one connection.

use crate::IrcMessage;
use filterwatch_core::{ChannelName, Hostmask, Nick};
use filterwatch_interface::{Presence, TransportEvent};
use std::collections::BTreeMap;
use tracing::{debug, info, trace, warn};

const RPL_WELCOME: &str = "001";
const RPL_NAMREPLY: &str = "353";
const RPL_ENDOFNAMES: &str = "366";
const ERR_NICKNAMEINUSE: &str = "433";

const NICKSERV: &str = "NickServ";

/// Channel membership prefixes a NAMES reply may put before a nickname.
const MEMBER_PREFIXES: &[char] = &['~', '&', '@', '%', '+', '!'];

/// What the connection should do after an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Queue a line behind the other outbound traffic.
    Send(IrcMessage),
    /// Write a protocol reply immediately.
    Reply(IrcMessage),
    /// Tell the relay.
    Emit(TransportEvent),
}

/// Nickname bookkeeping and inbound translation for one connection.
///
/// A session is created per TCP connection. It knows the nickname the
/// instance wants, the one the server actually gave it, and whether the
/// services password may be used to take the wanted one back.
#[derive(Debug, Clone)]
pub struct Session {
    desired: Nick,
    current: Nick,
    password: Option<String>,
    registered: bool,
    names: BTreeMap<ChannelName, Vec<String>>,
}

impl Session {
    /// Start a session that will register as `nick`.
    pub fn new(nick: Nick, password: Option<String>) -> Self {
        Self {
            current: nick.clone(),
            desired: nick,
            password: password.filter(|p| !p.is_empty()),
            registered: false,
            names: BTreeMap::new(),
        }
    }

    /// Nickname the server currently knows us by.
    pub fn current(&self) -> &Nick {
        &self.current
    }

    /// Nickname we want.
    pub fn desired(&self) -> &Nick {
        &self.desired
    }

    /// Whether the welcome numeric has been received.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Lines that open the session.
    pub fn registration(&self, real_name: &str) -> Vec<IrcMessage> {
        let mut lines = Vec::with_capacity(3);
        if let Some(password) = &self.password {
            lines.push(IrcMessage::pass(password));
        }
        lines.push(IrcMessage::nick(self.current.as_str()));
        lines.push(IrcMessage::user(self.desired.as_str(), real_name));
        lines
    }

    /// Translate one inbound message.
    pub fn handle(&mut self, msg: &IrcMessage) -> Vec<Action> {
        match msg.command() {
            "PING" => vec![Action::Reply(IrcMessage::new("PONG", msg.params().to_vec()))],
            RPL_WELCOME => self.on_welcome(msg),
            ERR_NICKNAMEINUSE => self.on_nick_in_use(msg),
            RPL_NAMREPLY => self.on_names(msg),
            RPL_ENDOFNAMES => self.on_end_of_names(msg),
            "NICK" => self.on_nick(msg),
            "JOIN" => self.on_membership(msg, msg.param(0), msg.sender_nick(), Presence::Joined),
            "PART" => self.on_membership(msg, msg.param(0), msg.sender_nick(), Presence::Left),
            "KICK" => self.on_membership(msg, msg.param(0), msg.param(1), Presence::Left),
            "QUIT" => self.on_quit(msg),
            "PRIVMSG" => self.on_privmsg(msg),
            "ERROR" => {
                warn!(reason = msg.param(0).unwrap_or_default(), "Server closed the link");
                Vec::new()
            }
            _ => {
                trace!(command = msg.command(), "Ignoring message");
                Vec::new()
            }
        }
    }

    fn on_welcome(&mut self, msg: &IrcMessage) -> Vec<Action> {
        self.registered = true;
        if let Some(nick) = msg.param(0).and_then(|raw| Nick::new(raw).ok()) {
            self.current = nick;
        }
        info!(nick = %self.current, "Registered with server");

        let mut actions = Vec::new();
        if !self.has_desired_nick() {
            actions.extend(self.ghost());
        }
        actions.push(Action::Emit(TransportEvent::Connected));
        actions
    }

    fn on_nick_in_use(&mut self, msg: &IrcMessage) -> Vec<Action> {
        let taken = msg.param(1).unwrap_or(self.current.as_str());
        if self.registered {
            debug!(nick = taken, "Nickname still in use");
            return Vec::new();
        }
        match Nick::new(format!("{}_", taken)) {
            Ok(fallback) => {
                info!(taken, fallback = %fallback, "Nickname in use, trying fallback");
                self.current = fallback;
                vec![Action::Send(IrcMessage::nick(self.current.as_str()))]
            }
            Err(e) => {
                warn!(error = %e, "Cannot derive a fallback nickname");
                Vec::new()
            }
        }
    }

    fn on_names(&mut self, msg: &IrcMessage) -> Vec<Action> {
        let Some(channel) = msg.param(2).and_then(|raw| ChannelName::new(raw).ok()) else {
            return Vec::new();
        };
        let names = msg.param(3).unwrap_or_default();
        let members = names
            .split_whitespace()
            .map(|entry| entry.trim_start_matches(MEMBER_PREFIXES))
            .map(|entry| entry.split_once('!').map_or(entry, |(nick, _)| nick))
            .filter(|nick| !nick.is_empty() && !self.current.matches(nick))
            .map(str::to_string);
        self.names.entry(channel).or_default().extend(members);
        Vec::new()
    }

    fn on_end_of_names(&mut self, msg: &IrcMessage) -> Vec<Action> {
        let Some(channel) = msg.param(1).and_then(|raw| ChannelName::new(raw).ok()) else {
            return Vec::new();
        };
        let nicks = self.names.remove(&channel).unwrap_or_default();
        trace!(channel = %channel, members = nicks.len(), "Member list complete");
        vec![Action::Emit(TransportEvent::ChannelMembers { channel, nicks })]
    }

    fn on_nick(&mut self, msg: &IrcMessage) -> Vec<Action> {
        let (Some(old), Some(new)) = (msg.sender_nick(), msg.param(0)) else {
            return Vec::new();
        };
        if self.current.matches(old) {
            if let Ok(nick) = Nick::new(new) {
                info!(from = old, to = %nick, "Nickname changed");
                self.current = nick;
            }
            return Vec::new();
        }
        self.reclaim_if_freed(old)
    }

    fn on_membership(
        &mut self,
        msg: &IrcMessage,
        channel: Option<&str>,
        nick: Option<&str>,
        presence: Presence,
    ) -> Vec<Action> {
        let (Some(channel), Some(nick)) = (channel, nick) else {
            trace!(command = msg.command(), "Membership change without channel or nick");
            return Vec::new();
        };
        let Ok(channel) = ChannelName::new(channel) else {
            return Vec::new();
        };

        let event = if self.current.matches(nick) {
            match presence {
                Presence::Joined => TransportEvent::JoinedChannel(channel),
                Presence::Left => TransportEvent::LeftChannel(channel),
            }
        } else {
            TransportEvent::UserPresence {
                nick: nick.to_string(),
                channel,
                presence,
            }
        };
        vec![Action::Emit(event)]
    }

    fn on_quit(&mut self, msg: &IrcMessage) -> Vec<Action> {
        let Some(nick) = msg.sender_nick() else {
            return Vec::new();
        };
        if self.current.matches(nick) {
            return Vec::new();
        }
        let mut actions = vec![Action::Emit(TransportEvent::UserQuit {
            nick: nick.to_string(),
            message: msg.param(0).unwrap_or_default().to_string(),
        })];
        actions.extend(self.reclaim_if_freed(nick));
        actions
    }

    fn on_privmsg(&mut self, msg: &IrcMessage) -> Vec<Action> {
        let (Some(prefix), Some(target), Some(text)) = (msg.prefix(), msg.param(0), msg.param(1))
        else {
            return Vec::new();
        };
        match Hostmask::parse(prefix) {
            Ok(sender) => vec![Action::Emit(TransportEvent::Line {
                sender,
                target: target.to_string(),
                text: text.to_string(),
            })],
            Err(_) => {
                trace!(prefix, "Ignoring message from a server");
                Vec::new()
            }
        }
    }

    fn has_desired_nick(&self) -> bool {
        self.desired.matches(self.current.as_str())
    }

    fn ghost(&self) -> Vec<Action> {
        let Some(password) = &self.password else {
            return Vec::new();
        };
        info!(nick = %self.desired, "Asking services to release our nickname");
        vec![
            Action::Send(IrcMessage::privmsg(
                NICKSERV,
                &format!("GHOST {} {}", self.desired, password),
            )),
            Action::Send(IrcMessage::nick(self.desired.as_str())),
        ]
    }

    fn reclaim_if_freed(&self, departed: &str) -> Vec<Action> {
        if self.registered && !self.has_desired_nick() && self.desired.matches(departed) {
            info!(nick = %self.desired, "Nickname released, reclaiming it");
            return vec![Action::Send(IrcMessage::nick(self.desired.as_str()))];
        }
        Vec::new()
    }
}

//! Operator command recognition.

use filterwatch_core::{HostPattern, Hostmask, Nick};
use regex::Regex;
use tracing::{trace, warn};

/// A privileged operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Command {
    /// Reload the configuration file on every instance sharing it.
    #[display("rehash")]
    Rehash,
    /// Act as master.
    #[display("start")]
    Start,
    /// Stop acting as master.
    #[display("stop")]
    Stop,
}

impl Command {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "rehash" => Some(Self::Rehash),
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Recognizes `<nick>[,:] <command>` lines from authorized hosts.
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    admin_hosts: Vec<HostPattern>,
    addressed: Option<(Nick, Regex)>,
}

impl CommandInterpreter {
    /// An interpreter honoring senders whose host matches one of `admin_hosts`.
    pub fn new(admin_hosts: Vec<HostPattern>) -> Self {
        Self {
            admin_hosts,
            addressed: None,
        }
    }

    /// Operator host patterns in force.
    pub fn admin_hosts(&self) -> &[HostPattern] {
        &self.admin_hosts
    }

    /// Replace the operator host patterns after a reload.
    pub fn set_admin_hosts(&mut self, admin_hosts: Vec<HostPattern>) {
        self.admin_hosts = admin_hosts;
    }

    /// Whether `sender` may issue commands.
    pub fn is_authorized(&self, sender: &Hostmask) -> bool {
        self.admin_hosts
            .iter()
            .any(|pattern| pattern.matches(sender.host()))
    }

    /// The command in `text`, if it is addressed to `own_nick`, comes from an
    /// authorized host and names a known command.
    ///
    /// Everything else is routine chatter and yields `None`.
    pub fn interpret(&mut self, own_nick: &Nick, sender: &Hostmask, text: &str) -> Option<Command> {
        let word = self.addressed_text(own_nick, text)?;

        if !self.is_authorized(sender) {
            trace!(sender = %sender, "Ignoring command from unauthorized host");
            return None;
        }

        let command = Command::from_word(&word);
        if command.is_none() {
            trace!(sender = %sender, text = %word, "Ignoring unknown command");
        }
        command
    }

    fn addressed_text(&mut self, own_nick: &Nick, text: &str) -> Option<String> {
        let stale = self
            .addressed
            .as_ref()
            .is_none_or(|(nick, _)| nick != own_nick);
        if stale {
            let pattern = format!(r"(?i)^{}[,:]?\s+(.+)$", regex::escape(own_nick.as_str()));
            match Regex::new(&pattern) {
                Ok(regex) => self.addressed = Some((own_nick.clone(), regex)),
                Err(e) => {
                    warn!(error = %e, nick = %own_nick, "Cannot build command pattern");
                    return None;
                }
            }
        }

        let (_, regex) = self.addressed.as_ref()?;
        let captures = regex.captures(text)?;
        captures.get(1).map(|m| m.as_str().trim().to_string())
    }
}

//! Single IRC protocol lines.

use filterwatch_error::{TransportError, TransportErrorKind};
use std::fmt;

/// One IRC message: optional prefix, command (or numeric) and parameters.
///
/// # Examples
///
/// ```
/// use filterwatch_irc::IrcMessage;
///
/// let msg = IrcMessage::parse(":alice!a@host PRIVMSG #chan :hello there\r\n").unwrap();
/// assert_eq!(msg.command(), "PRIVMSG");
/// assert_eq!(msg.sender_nick(), Some("alice"));
/// assert_eq!(msg.params(), ["#chan", "hello there"]);
/// assert_eq!(msg.to_string(), ":alice!a@host PRIVMSG #chan :hello there");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    prefix: Option<String>,
    command: String,
    params: Vec<String>,
}

impl IrcMessage {
    /// Build an outbound message without a prefix.
    pub fn new<I, S>(command: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse one line. Message tags are skipped and a trailing CR/LF is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `Protocol` if the line has no command.
    pub fn parse(line: &str) -> Result<Self, TransportError> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if rest.starts_with('@') {
            rest = rest.split_once(' ').map(|(_, tail)| tail).unwrap_or("");
        }
        rest = rest.trim_start_matches(' ');

        let prefix = match rest.strip_prefix(':') {
            Some(tail) => {
                let (prefix, tail) = tail.split_once(' ').unwrap_or((tail, ""));
                rest = tail.trim_start_matches(' ');
                Some(prefix.to_string())
            }
            None => None,
        };

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(TransportError::new(TransportErrorKind::Protocol(format!(
                "No command in line {:?}",
                line
            ))));
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            let (param, tail) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_string());
            rest = tail;
        }

        Ok(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// `nick!user@host` or server name, if present.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Command word, upper-cased, or three-digit numeric.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// All parameters, the trailing one included.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Parameter at `index`.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Nickname part of the prefix.
    pub fn sender_nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|prefix| prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    /// `PASS password`
    pub fn pass(password: &str) -> Self {
        Self::new("PASS", [password])
    }

    /// `NICK nick`
    pub fn nick(nick: &str) -> Self {
        Self::new("NICK", [nick])
    }

    /// `USER user 0 * :real name`
    pub fn user(user: &str, real_name: &str) -> Self {
        Self::new("USER", [user, "0", "*", real_name])
    }

    /// `JOIN #channel`
    pub fn join(channel: &str) -> Self {
        Self::new("JOIN", [channel])
    }

    /// `PART #channel`
    pub fn part(channel: &str) -> Self {
        Self::new("PART", [channel])
    }

    /// `PRIVMSG target :text`
    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", [target, text])
    }

    /// `QUIT :message`
    pub fn quit(message: &str) -> Self {
        Self::new("QUIT", [message])
    }
}

impl fmt::Display for IrcMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        write!(f, "{}", self.command)?;
        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                write!(f, " {}", param)?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{}", last)?;
            } else {
                write!(f, " {}", last)?;
            }
        }
        Ok(())
    }
}

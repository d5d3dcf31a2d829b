//! IRC identities.

use filterwatch_error::{ValidationError, ValidationErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An IRC nickname.
///
/// Nicknames keep their original case for display; comparisons through
/// [`Nick::matches`] are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(try_from = "String", into = "String")]
#[display("{}", _0)]
pub struct Nick(String);

impl Nick {
    /// Validate a nickname.
    #[track_caller]
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::new(ValidationErrorKind::Nick(
                raw.as_ref().to_string(),
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the nickname as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison with another nickname.
    ///
    /// # Examples
    ///
    /// ```
    /// use filterwatch_core::Nick;
    ///
    /// let nick = Nick::new("AbuseBot").unwrap();
    /// assert!(nick.matches("abusebot"));
    /// assert!(!nick.matches("AbuseBot_"));
    /// ```
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl FromStr for Nick {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Nick {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Nick> for String {
    fn from(value: Nick) -> Self {
        value.0
    }
}

/// Full sender identity of an IRC line: `nick!user@host`.
///
/// # Examples
///
/// ```
/// use filterwatch_core::Hostmask;
///
/// let mask: Hostmask = "alice!~alice@wikimedia/alice".parse().unwrap();
/// assert_eq!(mask.nick(), "alice");
/// assert_eq!(mask.host(), "wikimedia/alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{}!{}@{}", nick, user, host)]
pub struct Hostmask {
    nick: String,
    user: String,
    host: String,
}

impl Hostmask {
    /// Parse a `nick!user@host` prefix.
    #[track_caller]
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::new(ValidationErrorKind::Hostmask(raw.to_string()));
        let (nick, rest) = raw.split_once('!').ok_or_else(invalid)?;
        let (user, host) = rest.split_once('@').ok_or_else(invalid)?;
        if nick.is_empty() || host.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            nick: nick.to_string(),
            user: user.to_string(),
            host: host.to_string(),
        })
    }

    /// Sender nickname.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Sender ident.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Sender host (or cloak).
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl FromStr for Hostmask {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

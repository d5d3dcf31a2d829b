//! Source and channel identifiers.

use filterwatch_error::{ValidationError, ValidationErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Address of one wiki, e.g. `en.wikipedia.org`.
///
/// Stored lowercased. Must be non-empty and contain neither whitespace nor `:`
/// (the separator of the configuration tables).
///
/// # Examples
///
/// ```
/// use filterwatch_core::SourceName;
///
/// let name: SourceName = "Meta.Wikimedia.org".parse().unwrap();
/// assert_eq!(name.as_str(), "meta.wikimedia.org");
/// assert!("bad name".parse::<SourceName>().is_err());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(try_from = "String", into = "String")]
#[display("{}", _0)]
pub struct SourceName(String);

impl SourceName {
    /// Validate and normalize a source name.
    #[track_caller]
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() || trimmed.chars().any(|c| c.is_whitespace() || c == ':') {
            return Err(ValidationError::new(ValidationErrorKind::SourceName(
                raw.as_ref().to_string(),
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Borrow the normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SourceName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SourceName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SourceName> for String {
    fn from(value: SourceName) -> Self {
        value.0
    }
}

/// An IRC channel, e.g. `#wikipedia-en-abuselog`.
///
/// IRC channel names are case-insensitive, so the name is stored lowercased.
///
/// # Examples
///
/// ```
/// use filterwatch_core::ChannelName;
///
/// let chan = ChannelName::new("#Mod").unwrap();
/// assert_eq!(chan.as_str(), "#mod");
/// assert!(ChannelName::new("mod").is_err());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(try_from = "String", into = "String")]
#[display("{}", _0)]
pub struct ChannelName(String);

impl ChannelName {
    /// Validate and normalize a channel name.
    #[track_caller]
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = raw.as_ref().trim();
        let valid_prefix = trimmed.starts_with('#') || trimmed.starts_with('&');
        let valid_body = trimmed.len() > 1
            && !trimmed
                .chars()
                .any(|c| c.is_whitespace() || c == ',' || c == '\u{7}');
        if !valid_prefix || !valid_body {
            return Err(ValidationError::new(ValidationErrorKind::ChannelName(
                raw.as_ref().to_string(),
            )));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Borrow the normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a message target names a channel rather than a user.
    pub fn is_channel_target(target: &str) -> bool {
        target.starts_with('#') || target.starts_with('&')
    }
}

impl FromStr for ChannelName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChannelName> for String {
    fn from(value: ChannelName) -> Self {
        value.0
    }
}

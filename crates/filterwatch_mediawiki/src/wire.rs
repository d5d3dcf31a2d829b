//! Decoding of MediaWiki action API responses.
//!
//! Every function takes the raw response body and either yields the payload
//! or a [`SourceError`] classified for the reader: `aflblocked` and `blocked`
//! API errors are [`SourceErrorKind::Blocked`], a rejected login is
//! [`SourceErrorKind::Authentication`], and anything else (other API errors,
//! malformed JSON, missing members) is [`SourceErrorKind::Transient`].

use chrono::{DateTime, Utc};
use filterwatch_core::LogEntry;
use filterwatch_error::{SourceError, SourceErrorKind};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};

const BLOCKED_CODES: &[&str] = &["aflblocked", "blocked"];
const LOGIN_SUCCESS: &str = "Success";

/// The `error` member of a failed API call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable explanation.
    #[serde(default)]
    pub info: String,
}

impl ApiError {
    /// Map the API error onto the reader's error classes.
    #[track_caller]
    pub fn into_source_error(self) -> SourceError {
        let message = format!("{}: {}", self.code, self.info);
        if BLOCKED_CODES.contains(&self.code.as_str()) {
            SourceError::new(SourceErrorKind::Blocked(message))
        } else {
            SourceError::new(SourceErrorKind::Transient(message))
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Default, Deserialize)]
struct AbuseLogBody {
    #[serde(default)]
    query: Option<AbuseLogQuery>,
}

#[derive(Debug, Deserialize)]
struct AbuseLogQuery {
    #[serde(default)]
    abuselog: Vec<WireEntry>,
}

#[derive(Debug, Deserialize)]
struct WireEntry {
    #[serde(deserialize_with = "numeric_id")]
    id: u64,
    #[serde(deserialize_with = "text_or_number")]
    filter_id: String,
    #[serde(default)]
    filter: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    result: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

impl From<WireEntry> for LogEntry {
    fn from(wire: WireEntry) -> Self {
        Self {
            id: wire.id,
            filter_id: wire.filter_id,
            user: wire.user,
            page: wire.title,
            action: wire.action,
            result: wire.result,
            filter_description: wire.filter,
            timestamp: wire.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    query: Option<TokenQuery>,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    tokens: Tokens,
}

#[derive(Debug, Deserialize)]
struct Tokens {
    logintoken: String,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    login: Option<LoginOutcome>,
}

#[derive(Debug, Deserialize)]
struct LoginOutcome {
    result: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(u64),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Number(number) => number.to_string(),
    })
}

fn numeric_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Number(number) => Ok(number),
        TextOrNumber::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

#[track_caller]
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, SourceError> {
    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|e| {
        SourceError::new(SourceErrorKind::Transient(format!(
            "Malformed API response: {}",
            e
        )))
    })?;
    match envelope.error {
        Some(error) => Err(error.into_source_error()),
        None => Ok(envelope.body),
    }
}

#[track_caller]
fn missing(member: &str) -> SourceError {
    SourceError::new(SourceErrorKind::Transient(format!(
        "API response has no {} member",
        member
    )))
}

/// Decode a `list=abuselog` query into entries, in the order the wiki sent
/// them (newest first).
///
/// # Errors
///
/// `Blocked` for an `aflblocked`/`blocked` API error, `Transient` otherwise.
pub fn parse_abuse_log(body: &str) -> Result<Vec<LogEntry>, SourceError> {
    let body: AbuseLogBody = decode(body)?;
    let query = body.query.ok_or_else(|| missing("query"))?;
    Ok(query.abuselog.into_iter().map(LogEntry::from).collect())
}

/// Extract the token from a `meta=tokens&type=login` query.
///
/// # Errors
///
/// `Transient` if the token is absent or the call failed.
pub fn parse_login_token(body: &str) -> Result<String, SourceError> {
    let body: TokenBody = decode(body)?;
    body.query
        .map(|query| query.tokens.logintoken)
        .ok_or_else(|| missing("query.tokens"))
}

/// Check the outcome of `action=login`.
///
/// # Errors
///
/// `Authentication` for any result other than `Success`, `Transient` if the
/// call itself failed.
pub fn parse_login_result(body: &str) -> Result<(), SourceError> {
    let body: LoginBody = decode(body)?;
    let outcome = body.login.ok_or_else(|| missing("login"))?;
    if outcome.result == LOGIN_SUCCESS {
        return Ok(());
    }
    let message = match outcome.reason {
        Some(reason) => format!("{}: {}", outcome.result, reason),
        None => outcome.result,
    };
    Err(SourceError::new(SourceErrorKind::Authentication(message)))
}

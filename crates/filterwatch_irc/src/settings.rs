//! Connection parameters.

use derive_getters::Getters;
use filterwatch_core::Nick;
use std::time::Duration;
use typed_builder::TypedBuilder;

/// Where and as whom an [`IrcTransport`](crate::IrcTransport) connects.
///
/// # Examples
///
/// ```
/// use filterwatch_core::Nick;
/// use filterwatch_irc::IrcSettings;
/// use std::time::Duration;
///
/// let settings = IrcSettings::builder()
///     .host("irc.libera.chat")
///     .nick(Nick::new("AbuseBot").unwrap())
///     .build();
/// assert_eq!(*settings.port(), 6667);
/// assert!(!*settings.ssl());
/// assert_eq!(*settings.line_rate(), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Getters, TypedBuilder)]
pub struct IrcSettings {
    /// Server host name.
    #[builder(setter(into))]
    host: String,

    /// Server port.
    #[builder(default = 6667)]
    port: u16,

    /// Wrap the connection in TLS, verified against the webpki roots.
    #[builder(default)]
    ssl: bool,

    /// Nickname to register with.
    nick: Nick,

    /// Real name (gecos).
    #[builder(default, setter(into))]
    real_name: String,

    /// Sent as `PASS` and used to ghost a stale session holding our nick.
    #[builder(default, setter(into))]
    password: Option<String>,

    /// Minimum spacing of queued outbound lines.
    #[builder(default = Duration::from_secs(2))]
    line_rate: Duration,

    /// First reconnect delay.
    #[builder(default = Duration::from_secs(1))]
    initial_backoff: Duration,

    /// Longest reconnect delay.
    #[builder(default = Duration::from_secs(60))]
    max_backoff: Duration,
}

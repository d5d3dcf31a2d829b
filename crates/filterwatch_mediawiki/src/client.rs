use crate::wire;
use filterwatch_core::{LogEntry, SourceName};
use filterwatch_error::{SourceError, SourceErrorKind};
use filterwatch_interface::{LogSource, SourceConnector};
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("filterwatch/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Entries requested per poll. Only the most recent page is ever read.
const PAGE_SIZE: &str = "50";

const ABUSE_LOG_PROPS: &str = "ids|user|title|action|result|filter|timestamp";

/// Action API endpoint of a wiki.
///
/// # Examples
///
/// ```
/// use filterwatch_core::SourceName;
/// use filterwatch_mediawiki::endpoint_for;
///
/// let source = SourceName::new("en.wikipedia.org").unwrap();
/// assert_eq!(endpoint_for(&source), "https://en.wikipedia.org/w/api.php");
/// ```
pub fn endpoint_for(source: &SourceName) -> String {
    format!("https://{}/w/api.php", source)
}

/// One wiki's abuse log, read over the action API.
#[derive(Debug, Clone)]
pub struct MediaWikiSource {
    name: SourceName,
    endpoint: String,
    client: Client,
}

impl MediaWikiSource {
    /// Creates a source for `name` using `client` for every request.
    ///
    /// The client should keep cookies, otherwise the login session is lost
    /// between calls.
    pub fn new(name: SourceName, client: Client) -> Self {
        let endpoint = endpoint_for(&name);
        Self {
            name,
            endpoint,
            client,
        }
    }

    /// Overrides the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// The API endpoint requests go to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, request: RequestBuilder) -> Result<String, SourceError> {
        let response = request.send().await.map_err(|e| {
            debug!(error = ?e, "Request to wiki failed");
            SourceError::new(SourceErrorKind::Transient(format!("Request failed: {}", e)))
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = %status, "Wiki returned an HTTP error");
            return Err(SourceError::new(SourceErrorKind::Transient(format!(
                "HTTP {}",
                status
            ))));
        }

        response.text().await.map_err(|e| {
            debug!(error = ?e, "Failed to read wiki response");
            SourceError::new(SourceErrorKind::Transient(format!(
                "Failed to read response: {}",
                e
            )))
        })
    }

    async fn login_token(&self) -> Result<String, SourceError> {
        let request = self.client.get(&self.endpoint).query(&[
            ("action", "query"),
            ("meta", "tokens"),
            ("type", "login"),
            ("format", "json"),
            ("formatversion", "2"),
        ]);
        wire::parse_login_token(&self.call(request).await?)
    }
}

#[async_trait::async_trait]
impl LogSource for MediaWikiSource {
    fn name(&self) -> &SourceName {
        &self.name
    }

    #[instrument(skip(self, secret), fields(source = %self.name))]
    async fn authenticate(&self, user: &str, secret: &str) -> Result<(), SourceError> {
        if user.is_empty() {
            debug!("No wiki account configured, reading anonymously");
            return Ok(());
        }

        let token = self.login_token().await?;
        let request = self.client.post(&self.endpoint).form(&[
            ("action", "login"),
            ("lgname", user),
            ("lgpassword", secret),
            ("lgtoken", token.as_str()),
            ("format", "json"),
            ("formatversion", "2"),
        ]);
        wire::parse_login_result(&self.call(request).await?)?;

        debug!("Logged in");
        Ok(())
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn fetch_recent(&self) -> Result<Vec<LogEntry>, SourceError> {
        let request = self.client.get(&self.endpoint).query(&[
            ("action", "query"),
            ("list", "abuselog"),
            ("aflprop", ABUSE_LOG_PROPS),
            ("afllimit", PAGE_SIZE),
            ("format", "json"),
            ("formatversion", "2"),
        ]);
        let entries = wire::parse_abuse_log(&self.call(request).await?)?;
        debug!(count = entries.len(), "Fetched abuse log");
        Ok(entries)
    }
}

/// Creates a [`MediaWikiSource`] with a fresh cookie jar per wiki.
#[derive(Debug, Clone)]
pub struct MediaWikiConnector {
    user_agent: String,
    timeout: Duration,
}

impl MediaWikiConnector {
    /// Creates a connector with the default user agent and a 30 s timeout.
    pub fn new() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the user agent sent to every wiki.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the source for `name` without erasing its type.
    ///
    /// # Errors
    ///
    /// `Transient` if the HTTP client could not be constructed.
    pub fn source(&self, name: &SourceName) -> Result<MediaWikiSource, SourceError> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                SourceError::new(SourceErrorKind::Transient(format!(
                    "Failed to build HTTP client: {}",
                    e
                )))
            })?;
        Ok(MediaWikiSource::new(name.clone(), client))
    }
}

impl Default for MediaWikiConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceConnector for MediaWikiConnector {
    fn connect(&self, source: &SourceName) -> Result<Arc<dyn LogSource>, SourceError> {
        Ok(Arc::new(self.source(source)?))
    }
}

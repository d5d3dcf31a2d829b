//! Top-level error wrapper types.

use crate::{ConfigError, RelayError, SourceError, TransportError, ValidationError};

/// Every error the workspace can surface.
///
/// # Examples
///
/// ```
/// use filterwatch_error::{FilterwatchError, TransportError, TransportErrorKind};
///
/// let err: FilterwatchError = TransportError::new(TransportErrorKind::Disconnected).into();
/// assert!(format!("{}", err).contains("Transport Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum FilterwatchErrorKind {
    /// Identifier or template validation error
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Log source error
    #[from(SourceError)]
    Source(SourceError),
    /// Chat transport error
    #[from(TransportError)]
    Transport(TransportError),
    /// Relay coordination error
    #[from(RelayError)]
    Relay(RelayError),
}

/// Filterwatch error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Filterwatch Error: {}", _0)]
pub struct FilterwatchError(Box<FilterwatchErrorKind>);

impl FilterwatchError {
    /// Create a new error from a kind.
    pub fn new(kind: FilterwatchErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FilterwatchErrorKind {
        &self.0
    }
}

impl<T> From<T> for FilterwatchError
where
    T: Into<FilterwatchErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for filterwatch operations.
pub type FilterwatchResult<T> = std::result::Result<T, FilterwatchError>;

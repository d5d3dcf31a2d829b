//! Relay engine error types.

use crate::{ConfigError, TransportError};

/// Error kinds for relay coordination.
#[derive(Debug, Clone, derive_more::Display)]
pub enum RelayErrorKind {
    /// Configuration could not be applied.
    #[display("{}", _0)]
    Config(ConfigError),

    /// The chat transport refused an operation.
    #[display("{}", _0)]
    Transport(TransportError),

    /// A peer instance's main loop is no longer running.
    #[display("Instance '{}' is not running", _0)]
    InstanceGone(String),

    /// Some instances reloaded, others did not.
    #[display("Reload failed on {:?} (reloaded: {:?})", failed, reloaded)]
    PartialReload {
        /// Instances that reloaded successfully.
        reloaded: Vec<String>,
        /// Instances that failed.
        failed: Vec<String>,
    },
}

/// Relay error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Relay Error: {} at line {} in {}", kind, line, file)]
pub struct RelayError {
    /// The error kind
    pub kind: RelayErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl RelayError {
    /// Create a new RelayError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RelayErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<ConfigError> for RelayError {
    #[track_caller]
    fn from(e: ConfigError) -> Self {
        Self::new(RelayErrorKind::Config(e))
    }
}

impl From<TransportError> for RelayError {
    #[track_caller]
    fn from(e: TransportError) -> Self {
        Self::new(RelayErrorKind::Transport(e))
    }
}

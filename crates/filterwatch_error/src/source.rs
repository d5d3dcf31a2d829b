//! Data-source (wiki) error types.

/// Error kinds reported by a log source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SourceErrorKind {
    /// Network failure, expired session, or malformed response. Retry next cycle.
    #[display("Transient source failure: {}", _0)]
    Transient(String),

    /// The bot is blocked from reading this source's log. Never retried.
    #[display("Blocked by source: {}", _0)]
    Blocked(String),

    /// Login was rejected.
    #[display("Authentication failed: {}", _0)]
    Authentication(String),
}

impl SourceErrorKind {
    /// Whether the failure should remove the reader rather than skip a cycle.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Blocked(_) | Self::Authentication(_))
    }
}

/// Source error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Source Error: {} at line {} in {}", kind, line, file)]
pub struct SourceError {
    /// The error kind
    pub kind: SourceErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl SourceError {
    /// Create a new SourceError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SourceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Check if the error is permanent for the reader that hit it.
    pub fn is_permanent(&self) -> bool {
        self.kind.is_permanent()
    }
}

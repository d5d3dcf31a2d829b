//! Chat transport error types.

/// Error kinds for the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TransportErrorKind {
    /// Socket-level failure.
    #[display("I/O error: {}", _0)]
    Io(String),

    /// TLS could not be set up.
    #[display("TLS error: {}", _0)]
    Tls(String),

    /// The connection is not established (or was closed).
    #[display("Transport disconnected")]
    Disconnected,

    /// The server sent something we could not make sense of.
    #[display("Protocol error: {}", _0)]
    Protocol(String),
}

/// Transport error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Transport Error: {} at line {} in {}", kind, line, file)]
pub struct TransportError {
    /// The error kind
    pub kind: TransportErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl TransportError {
    /// Create a new TransportError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TransportErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<std::io::Error> for TransportError {
    #[track_caller]
    fn from(e: std::io::Error) -> Self {
        Self::new(TransportErrorKind::Io(e.to_string()))
    }
}

//! Validation errors for core identifiers and templates.

/// Reasons a value failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ValidationErrorKind {
    /// Source name is empty or contains forbidden characters.
    #[display("Invalid source name '{}'", _0)]
    SourceName(String),

    /// Channel name does not start with '#' or '&', or contains whitespace/commas.
    #[display("Invalid channel name '{}'", _0)]
    ChannelName(String),

    /// Nickname is empty or contains whitespace.
    #[display("Invalid nickname '{}'", _0)]
    Nick(String),

    /// Hostmask is not of the form nick!user@host.
    #[display("Invalid hostmask '{}'", _0)]
    Hostmask(String),

    /// Host pattern could not be compiled.
    #[display("Invalid host pattern '{}': {}", pattern, reason)]
    HostPattern {
        /// Offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Line template is malformed.
    #[display("Invalid line template '{}': {}", template, reason)]
    Template {
        /// Offending template.
        template: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Validation error with source location.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The error kind
    pub kind: ValidationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use filterwatch_error::{ValidationError, ValidationErrorKind};
    ///
    /// let err = ValidationError::new(ValidationErrorKind::Nick(String::new()));
    /// assert!(err.to_string().contains("Invalid nickname"));
    /// ```
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

//! Configuration error types.

use std::path::PathBuf;

/// Reasons a configuration load or reload failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConfigErrorKind {
    /// The file could not be read.
    #[display("File I/O error: {} ({})", path.display(), message)]
    FileIo {
        /// Path that caused the error.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// TOML syntax or shape error.
    #[display("TOML parsing error: {}", _0)]
    Toml(String),

    /// A referenced bot section does not exist.
    #[display("Missing bot section '{}'", _0)]
    MissingSection(String),

    /// A required field is absent or empty.
    #[display("Missing field '{}' in section '{}'", field, section)]
    MissingField {
        /// Section (bot nick) being read.
        section: String,
        /// Field name.
        field: String,
    },

    /// A `source: values` table line could not be parsed.
    #[display("Invalid '{}' entry on line {}: {}", table, line_number, reason)]
    InvalidTable {
        /// Table name (`wikis_channels`, `ignored_filters`, `formats`).
        table: String,
        /// 1-based line within the table.
        line_number: usize,
        /// Why it was rejected.
        reason: String,
    },

    /// A scalar field has an unusable value.
    #[display("Invalid value for '{}': {}", field, reason)]
    InvalidValue {
        /// Field name.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Configuration error with source location.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    /// The error kind
    pub kind: ConfigErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use filterwatch_error::{ConfigError, ConfigErrorKind};
    ///
    /// let err = ConfigError::new(ConfigErrorKind::MissingSection("AbuseBot".into()));
    /// assert!(err.to_string().contains("AbuseBot"));
    /// ```
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

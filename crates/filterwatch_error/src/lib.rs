//! Error types for filterwatch.
//!
//! This crate provides the foundation error types used throughout the relay.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use filterwatch_error::{FilterwatchResult, SourceError, SourceErrorKind};
//!
//! fn fetch() -> FilterwatchResult<Vec<u64>> {
//!     Err(SourceError::new(SourceErrorKind::Transient("timed out".into())))?
//! }
//!
//! assert!(fetch().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod core;
mod error;
mod relay;
mod source;
mod transport;

pub use config::{ConfigError, ConfigErrorKind};
pub use core::{ValidationError, ValidationErrorKind};
pub use error::{FilterwatchError, FilterwatchErrorKind, FilterwatchResult};
pub use relay::{RelayError, RelayErrorKind};
pub use source::{SourceError, SourceErrorKind};
pub use transport::{TransportError, TransportErrorKind};

//! MediaWiki abuse-log source.
//!
//! [`MediaWikiConnector`] hands out one [`MediaWikiSource`] per wiki. Each
//! source talks to the wiki's action API (`/w/api.php`) with its own cookie
//! jar, so a login on one wiki never leaks into another.
//!
//! Response bodies are decoded by the functions in [`wire`], which are kept
//! free of I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
pub mod wire;

pub use client::{MediaWikiConnector, MediaWikiSource, endpoint_for};

//! Process bootstrap for the filterwatch relay.
//!
//! The `filterwatch` binary reads one bot file, starts an IRC connection and
//! a relay loop for every instance the file enables, and stops them all on
//! Ctrl-C. The pieces live here so they can be tested without a terminal.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
mod launcher;
mod observability;

pub use cli::Cli;
pub use launcher::{Launcher, describe_plan, irc_settings};
pub use observability::{ObservabilityConfig, init_observability};

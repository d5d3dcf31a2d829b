//! Core data types for the filterwatch abuse-log relay.
//!
//! This crate provides the validated identifiers and value types shared by
//! every other crate: source and channel names, IRC identities, operator host
//! patterns, abuse-log entries and the line templates used to render them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod entry;
mod host_pattern;
mod identity;
mod names;
mod template;

pub use entry::{LogEntry, LogEntryBuilder};
pub use host_pattern::HostPattern;
pub use identity::{Hostmask, Nick};
pub use names::{ChannelName, SourceName};
pub use template::{LineTemplate, TemplateField};

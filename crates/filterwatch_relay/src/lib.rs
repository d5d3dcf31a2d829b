//! The filterwatch relay engine.
//!
//! A [`RelayCoordinator`] drives one bot instance. It owns:
//!
//! - one [`SourceReader`] per routed wiki, polling that wiki's abuse log off
//!   the main loop and deduplicating against a watermark on it;
//! - the [`RoutingTable`], which reconciles itself against a reloaded
//!   configuration and tracks which channels are actually joined;
//! - the [`RoleController`], the master/slave state machine that gates
//!   every post;
//! - the [`CommandInterpreter`], which turns operator lines into commands.
//!
//! All of these are mutated only from the coordinator's main loop. Instances
//! in one process find each other through an [`InstanceRegistry`] so that a
//! `rehash` reaches every instance sharing the configuration file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod coordinator;
mod reader;
mod registry;
mod role;
mod routing;

pub use command::{Command, CommandInterpreter};
pub use coordinator::{ReaderStatus, RelayCoordinator, RelayHandle, RelayMessage, RelayStatus};
pub use reader::{PollSettings, PollState, ReaderEvent, ReaderReport, SourceReader};
pub use registry::InstanceRegistry;
pub use role::{Role, RoleController, RoleOutcome, RoleTransition};
pub use routing::{ReconcilePlan, RoutingTable};

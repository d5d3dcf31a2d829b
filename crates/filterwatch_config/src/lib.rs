//! Reloadable configuration for filterwatch bot instances.
//!
//! One TOML file describes every bot instance in the process. Each
//! `[bots.<nick>]` table carries connection settings, the instance's role
//! (master or slave) and, for masters, three newline-delimited tables:
//!
//! - `wikis_channels`: `source: #channel #channel ...`
//! - `ignored_filters`: `source: filter-id filter-id ...`
//! - `formats`: `source: template`, with a `default` fallback key
//!
//! Slaves read the tables and wiki credentials from their master's section.
//! The tables are parsed once per load into a typed [`RelayTables`], so the
//! relay never looks anything up by string at event time.
//!
//! # Example
//!
//! ```
//! use filterwatch_config::BotsConfig;
//!
//! let config = BotsConfig::from_toml_str(r##"
//! [bots.AbuseBot]
//! host = "irc.example.org"
//! admin_hosts = ["user/alice"]
//! wikis_channels = "en.wikipedia.org: #abuse"
//! formats = "default: {user} tripped {filter_id}"
//! "##).unwrap();
//!
//! let instance = config.instance("AbuseBot").unwrap();
//! assert_eq!(instance.tables().required_channels().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod file;
mod instance;
mod store;
mod tables;

pub use file::{BotSection, BotsConfig};
pub use instance::{InstanceConfig, RoleConfig, StartupDecision, WikiCredentials};
pub use store::ConfigStore;
pub use tables::{RelayTables, SourceSettings};

//! TOML bot file structure.

use crate::{InstanceConfig, StartupDecision};
use derive_getters::Getters;
use filterwatch_error::{ConfigError, ConfigErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use typed_builder::TypedBuilder;

/// One `[bots.<nick>]` table, exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, TypedBuilder)]
pub struct BotSection {
    /// Whether to launch this instance at startup.
    #[builder(default = true)]
    #[serde(default = "default_start")]
    start: bool,

    /// IRC server host.
    #[builder(default, setter(into))]
    #[serde(default)]
    host: String,

    /// IRC server port.
    #[builder(default = 6667)]
    #[serde(default = "default_port")]
    port: u16,

    /// Connect over TLS.
    #[builder(default)]
    #[serde(default)]
    ssl: bool,

    /// IRC real name (gecos).
    #[builder(default, setter(into))]
    #[serde(default)]
    real_name: String,

    /// Server password, forwarded to NickServ on most networks.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    password: Option<String>,

    /// Run as a slave of `master`.
    #[builder(default)]
    #[serde(default)]
    slave: bool,

    /// Nickname of the master instance this slave shadows.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    master: Option<String>,

    /// Take over automatically when the master quits.
    #[builder(default)]
    #[serde(default)]
    autofailover: bool,

    /// Host patterns allowed to issue commands.
    #[builder(default)]
    #[serde(default)]
    admin_hosts: Vec<String>,

    /// Wiki account name.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    wiki_user: Option<String>,

    /// Wiki account password.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    wiki_password: Option<String>,

    /// Seconds between two fetches of one wiki's log.
    #[builder(default = 5)]
    #[serde(default = "default_poll_interval")]
    poll_interval_seconds: u64,

    /// `source: #channel ...` table.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    wikis_channels: Option<String>,

    /// `source: filter-id ...` table.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    ignored_filters: Option<String>,

    /// `source: template` table with a `default` key.
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    formats: Option<String>,
}

fn default_start() -> bool {
    true
}

fn default_port() -> u16 {
    6667
}

fn default_poll_interval() -> u64 {
    5
}

impl BotSection {
    /// The configured master nickname, if set and non-blank.
    pub fn master_nick(&self) -> Option<&str> {
        self.master.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }

    /// Whether a non-blank `wikis_channels` table is present.
    pub fn has_routes(&self) -> bool {
        self.wikis_channels
            .as_deref()
            .is_some_and(|table| !table.trim().is_empty())
    }
}

/// A parsed bot file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BotsConfig {
    /// Sections keyed by bot nickname.
    #[serde(default)]
    bots: BTreeMap<String, BotSection>,
}

impl BotsConfig {
    /// Parse a bot file from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Toml` if the text is not valid TOML or does not match the
    /// expected shape.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::new(ConfigErrorKind::Toml(e.to_string())))
    }

    /// Load a bot file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!("Loading bot configuration from file");

        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::new(ConfigErrorKind::FileIo {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        })?;

        let config = Self::from_toml_str(&contents)?;
        tracing::info!(sections = config.bots.len(), "Loaded bot configuration");
        Ok(config)
    }

    /// Build a configuration from sections (mostly useful in tests).
    pub fn from_sections(bots: impl IntoIterator<Item = (String, BotSection)>) -> Self {
        Self {
            bots: bots.into_iter().collect(),
        }
    }

    /// All sections.
    pub fn sections(&self) -> &BTreeMap<String, BotSection> {
        &self.bots
    }

    /// One section by nickname.
    pub fn section(&self, nick: &str) -> Option<&BotSection> {
        self.bots.get(nick)
    }

    /// Resolve the instance named `nick`: role, operators, credentials, and
    /// the relay tables it routes by (its master's, for a slave).
    ///
    /// # Errors
    ///
    /// Returns error if the section, its master's section, or any required
    /// field is missing, or if any table, template, or host pattern is invalid.
    pub fn instance(&self, nick: &str) -> Result<InstanceConfig, ConfigError> {
        InstanceConfig::resolve(self, nick)
    }

    /// Decide which instances to launch, applying the startup skip rules.
    ///
    /// # Errors
    ///
    /// Returns the first structural error of an instance that should start.
    pub fn startup_plan(&self) -> Result<Vec<StartupDecision>, ConfigError> {
        let mut plan = Vec::new();
        for (nick, section) in &self.bots {
            if !section.start {
                plan.push(StartupDecision::skip(nick, "start = false"));
                continue;
            }

            let routes_section = if section.slave {
                let Some(master) = section.master_nick() else {
                    plan.push(StartupDecision::skip(
                        nick,
                        "no master configured for this slave",
                    ));
                    continue;
                };
                match self.bots.get(master) {
                    Some(master_section) => master_section,
                    None => {
                        plan.push(StartupDecision::skip(
                            nick,
                            format!("master '{}' has no section", master),
                        ));
                        continue;
                    }
                }
            } else {
                section
            };

            if !routes_section.has_routes() {
                let reason = if section.slave {
                    "the master for this slave has no wikis_channels table"
                } else {
                    "no wikis_channels table configured for this master"
                };
                plan.push(StartupDecision::skip(nick, reason));
                continue;
            }

            plan.push(StartupDecision::Start(Box::new(self.instance(nick)?)));
        }
        Ok(plan)
    }
}

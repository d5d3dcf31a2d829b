//! Resolved per-instance configuration.

use crate::{BotSection, BotsConfig, RelayTables};
use filterwatch_core::{HostPattern, Nick};
use filterwatch_error::{ConfigError, ConfigErrorKind};
use std::time::Duration;

/// Configured authority of an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleConfig {
    /// Posts to its channels.
    Master,
    /// Shadows `master`, posting only while promoted.
    Slave {
        /// The master's nickname.
        master: Nick,
        /// Promote and demote automatically on the master's presence.
        auto_failover: bool,
    },
}

/// Wiki login used by every reader of an instance.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct WikiCredentials {
    /// Account name.
    pub user: String,
    /// Account password.
    pub password: String,
}

impl std::fmt::Debug for WikiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything one bot instance needs, validated.
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    nick: Nick,
    host: String,
    port: u16,
    ssl: bool,
    real_name: String,
    password: Option<String>,
    role: RoleConfig,
    admin_hosts: Vec<HostPattern>,
    credentials: WikiCredentials,
    poll_interval: Duration,
    tables: RelayTables,
}

impl InstanceConfig {
    pub(crate) fn resolve(config: &BotsConfig, nick: &str) -> Result<Self, ConfigError> {
        let section = config
            .section(nick)
            .ok_or_else(|| ConfigError::new(ConfigErrorKind::MissingSection(nick.to_string())))?;

        let parsed_nick = Nick::new(nick).map_err(|e| {
            ConfigError::new(ConfigErrorKind::InvalidValue {
                field: "nick".to_string(),
                reason: e.kind.to_string(),
            })
        })?;

        if section.host().trim().is_empty() {
            return Err(missing_field(nick, "host"));
        }

        let (role, shared_section, shared_name) = if *section.slave() {
            let master = section
                .master_nick()
                .ok_or_else(|| missing_field(nick, "master"))?;
            let master_section = config
                .section(master)
                .ok_or_else(|| ConfigError::new(ConfigErrorKind::MissingSection(master.to_string())))?;
            let master_nick = Nick::new(master).map_err(|e| {
                ConfigError::new(ConfigErrorKind::InvalidValue {
                    field: "master".to_string(),
                    reason: e.kind.to_string(),
                })
            })?;
            (
                RoleConfig::Slave {
                    master: master_nick,
                    auto_failover: *section.autofailover(),
                },
                master_section,
                master,
            )
        } else {
            (RoleConfig::Master, section, nick)
        };

        let tables = resolve_tables(shared_section, shared_name)?;

        let admin_hosts = section
            .admin_hosts()
            .iter()
            .map(|pattern| {
                HostPattern::new(pattern).map_err(|e| {
                    ConfigError::new(ConfigErrorKind::InvalidValue {
                        field: "admin_hosts".to_string(),
                        reason: e.kind.to_string(),
                    })
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if *section.poll_interval_seconds() == 0 {
            return Err(ConfigError::new(ConfigErrorKind::InvalidValue {
                field: "poll_interval_seconds".to_string(),
                reason: "must be at least 1".to_string(),
            }));
        }

        let credentials = WikiCredentials {
            user: shared_section.wiki_user().clone().unwrap_or_default(),
            password: shared_section.wiki_password().clone().unwrap_or_default(),
        };

        let password = section
            .password()
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Ok(Self {
            nick: parsed_nick,
            host: section.host().trim().to_string(),
            port: *section.port(),
            ssl: *section.ssl(),
            real_name: section.real_name().clone(),
            password,
            role,
            admin_hosts,
            credentials,
            poll_interval: Duration::from_secs(*section.poll_interval_seconds()),
            tables,
        })
    }

    /// Instance nickname (also its section name).
    pub fn nick(&self) -> &Nick {
        &self.nick
    }

    /// IRC server host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// IRC server port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the IRC connection uses TLS.
    pub fn ssl(&self) -> bool {
        self.ssl
    }

    /// IRC real name.
    pub fn real_name(&self) -> &str {
        &self.real_name
    }

    /// Server / NickServ password.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Configured role.
    pub fn role(&self) -> &RoleConfig {
        &self.role
    }

    /// Operator host patterns.
    pub fn admin_hosts(&self) -> &[HostPattern] {
        &self.admin_hosts
    }

    /// Wiki login.
    pub fn credentials(&self) -> &WikiCredentials {
        &self.credentials
    }

    /// Interval between fetches of one wiki.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Routing and per-source tables.
    pub fn tables(&self) -> &RelayTables {
        &self.tables
    }
}

fn resolve_tables(section: &BotSection, section_name: &str) -> Result<RelayTables, ConfigError> {
    if !section.has_routes() {
        return Err(missing_field(section_name, "wikis_channels"));
    }
    RelayTables::parse(
        section.wikis_channels().as_deref().unwrap_or_default(),
        section.ignored_filters().as_deref().unwrap_or_default(),
        section.formats().as_deref().unwrap_or_default(),
    )
}

#[track_caller]
fn missing_field(section: &str, field: &str) -> ConfigError {
    ConfigError::new(ConfigErrorKind::MissingField {
        section: section.to_string(),
        field: field.to_string(),
    })
}

/// What to do with one section at startup.
#[derive(Debug, Clone)]
pub enum StartupDecision {
    /// Launch this instance.
    Start(Box<InstanceConfig>),
    /// Do not launch it.
    Skip {
        /// Section name.
        nick: String,
        /// Why it is skipped.
        reason: String,
    },
}

impl StartupDecision {
    pub(crate) fn skip(nick: &str, reason: impl Into<String>) -> Self {
        Self::Skip {
            nick: nick.to_string(),
            reason: reason.into(),
        }
    }
}

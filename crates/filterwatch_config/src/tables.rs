//! Typed routing and per-source tables.

use filterwatch_core::{ChannelName, LineTemplate, SourceName};
use filterwatch_error::{ConfigError, ConfigErrorKind};
use std::collections::{BTreeMap, BTreeSet};

const DEFAULT_FORMAT_KEY: &str = "default";

/// Per-source settings resolved at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    excluded_filters: BTreeSet<String>,
    template: LineTemplate,
}

impl SourceSettings {
    /// Build settings directly (mostly useful in tests).
    pub fn new(excluded_filters: BTreeSet<String>, template: LineTemplate) -> Self {
        Self {
            excluded_filters,
            template,
        }
    }

    /// Filter ids whose hits are never relayed.
    pub fn excluded_filters(&self) -> &BTreeSet<String> {
        &self.excluded_filters
    }

    /// Template used to render this source's entries.
    pub fn template(&self) -> &LineTemplate {
        &self.template
    }
}

/// The wiki → channels routing table plus each routed wiki's settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelayTables {
    routes: BTreeMap<SourceName, BTreeSet<ChannelName>>,
    settings: BTreeMap<SourceName, SourceSettings>,
}

impl RelayTables {
    /// Parse the three newline-delimited tables.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTable` for any malformed line, a duplicated source, a
    /// source routed to no channel, an invalid template, or a routed source
    /// with neither its own template nor a `default` one.
    #[tracing::instrument(skip_all)]
    pub fn parse(
        wikis_channels: &str,
        ignored_filters: &str,
        formats: &str,
    ) -> Result<Self, ConfigError> {
        let mut routes = BTreeMap::new();
        for (line_number, key, value) in table_lines("wikis_channels", wikis_channels)? {
            let source = parse_source("wikis_channels", line_number, key)?;
            let mut channels = BTreeSet::new();
            for raw in value.split_whitespace() {
                let channel = ChannelName::new(raw).map_err(|e| {
                    invalid_line("wikis_channels", line_number, e.kind.to_string())
                })?;
                channels.insert(channel);
            }
            if channels.is_empty() {
                return Err(invalid_line(
                    "wikis_channels",
                    line_number,
                    format!("source '{}' has no channels", source),
                ));
            }
            if routes.insert(source.clone(), channels).is_some() {
                return Err(invalid_line(
                    "wikis_channels",
                    line_number,
                    format!("source '{}' listed twice", source),
                ));
            }
        }

        let mut exclusions: BTreeMap<SourceName, BTreeSet<String>> = BTreeMap::new();
        for (line_number, key, value) in table_lines("ignored_filters", ignored_filters)? {
            let source = parse_source("ignored_filters", line_number, key)?;
            if !routes.contains_key(&source) {
                tracing::warn!(source = %source, "Ignored filters configured for unrouted source");
            }
            exclusions
                .entry(source)
                .or_default()
                .extend(value.split_whitespace().map(str::to_string));
        }

        let mut default_template = None;
        let mut templates = BTreeMap::new();
        for (line_number, key, value) in table_lines("formats", formats)? {
            let template = LineTemplate::parse(value)
                .map_err(|e| invalid_line("formats", line_number, e.kind.to_string()))?;
            if key.eq_ignore_ascii_case(DEFAULT_FORMAT_KEY) {
                default_template = Some(template);
            } else {
                let source = parse_source("formats", line_number, key)?;
                templates.insert(source, template);
            }
        }

        let mut settings = BTreeMap::new();
        for source in routes.keys() {
            let template = templates
                .get(source)
                .or(default_template.as_ref())
                .cloned()
                .ok_or_else(|| {
                    ConfigError::new(ConfigErrorKind::InvalidTable {
                        table: "formats".to_string(),
                        line_number: 0,
                        reason: format!(
                            "no format for '{}' and no '{}' format",
                            source, DEFAULT_FORMAT_KEY
                        ),
                    })
                })?;
            let excluded = exclusions.get(source).cloned().unwrap_or_default();
            settings.insert(source.clone(), SourceSettings::new(excluded, template));
        }

        tracing::debug!(
            sources = routes.len(),
            excluded_sources = exclusions.len(),
            "Parsed relay tables"
        );

        Ok(Self { routes, settings })
    }

    /// Every route.
    pub fn routes(&self) -> &BTreeMap<SourceName, BTreeSet<ChannelName>> {
        &self.routes
    }

    /// Routed sources.
    pub fn sources(&self) -> BTreeSet<SourceName> {
        self.routes.keys().cloned().collect()
    }

    /// Channels `source` posts to, if routed.
    pub fn sinks(&self, source: &SourceName) -> Option<&BTreeSet<ChannelName>> {
        self.routes.get(source)
    }

    /// Settings for `source`, if routed.
    pub fn settings(&self, source: &SourceName) -> Option<&SourceSettings> {
        self.settings.get(source)
    }

    /// The union of every route's channels: exactly the channels the bot must be in.
    pub fn required_channels(&self) -> BTreeSet<ChannelName> {
        self.routes.values().flatten().cloned().collect()
    }

    /// Sources routed to `channel`.
    pub fn sources_for_channel(&self, channel: &ChannelName) -> Vec<SourceName> {
        self.routes
            .iter()
            .filter(|(_, channels)| channels.contains(channel))
            .map(|(source, _)| source.clone())
            .collect()
    }
}

/// Split a table into `(line_number, key, value)` triples, skipping blank lines.
fn table_lines<'a>(
    table: &str,
    raw: &'a str,
) -> Result<Vec<(usize, &'a str, &'a str)>, ConfigError> {
    let mut lines = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| invalid_line(table, index + 1, "expected 'key: value'".to_string()))?;
        lines.push((index + 1, key.trim(), value.trim()));
    }
    Ok(lines)
}

fn parse_source(table: &str, line_number: usize, key: &str) -> Result<SourceName, ConfigError> {
    SourceName::new(key).map_err(|e| invalid_line(table, line_number, e.kind.to_string()))
}

#[track_caller]
fn invalid_line(table: &str, line_number: usize, reason: String) -> ConfigError {
    ConfigError::new(ConfigErrorKind::InvalidTable {
        table: table.to_string(),
        line_number,
        reason,
    })
}

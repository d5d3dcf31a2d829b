//! Live routing state and reconciliation.

use filterwatch_config::RelayTables;
use filterwatch_core::{ChannelName, SourceName};
use std::collections::BTreeSet;

/// The steps needed to move from one configuration to the next, in the
/// order they must be carried out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Sources no longer configured: stop and discard their readers.
    pub removed_sources: BTreeSet<SourceName>,
    /// Sources still configured whose sinks are not all joined anymore:
    /// stop their readers until every sink is joined again.
    pub suspended_sources: BTreeSet<SourceName>,
    /// Sources still configured: re-apply exclusions and templates.
    pub persisting_sources: BTreeSet<SourceName>,
    /// Channels no longer required: leave them.
    pub removed_sinks: BTreeSet<ChannelName>,
    /// Newly configured sources whose sinks are all joined already: start now.
    pub start_now: BTreeSet<SourceName>,
    /// Newly configured sources: started later, on join confirmation, unless
    /// listed in `start_now`.
    pub added_sources: BTreeSet<SourceName>,
    /// Channels newly required: join them.
    pub added_sinks: BTreeSet<ChannelName>,
}

impl ReconcilePlan {
    /// Whether applying the plan changes nothing.
    pub fn is_empty(&self) -> bool {
        self.removed_sources.is_empty()
            && self.suspended_sources.is_empty()
            && self.removed_sinks.is_empty()
            && self.added_sources.is_empty()
            && self.added_sinks.is_empty()
    }
}

/// Configured routes plus the channels actually joined.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    tables: RelayTables,
    joined: BTreeSet<ChannelName>,
}

impl RoutingTable {
    /// A table with nothing joined yet.
    pub fn new(tables: RelayTables) -> Self {
        Self {
            tables,
            joined: BTreeSet::new(),
        }
    }

    /// Current routes and per-source settings.
    pub fn tables(&self) -> &RelayTables {
        &self.tables
    }

    /// Channels `source` posts to.
    pub fn sinks(&self, source: &SourceName) -> Option<&BTreeSet<ChannelName>> {
        self.tables.sinks(source)
    }

    /// The union of every route's sinks.
    pub fn required_channels(&self) -> BTreeSet<ChannelName> {
        self.tables.required_channels()
    }

    /// Whether `channel` is in some route.
    pub fn is_required(&self, channel: &ChannelName) -> bool {
        self.tables.routes().values().any(|sinks| sinks.contains(channel))
    }

    /// Channels the transport confirmed we are in.
    pub fn joined(&self) -> &BTreeSet<ChannelName> {
        &self.joined
    }

    /// Whether we are in `channel`.
    pub fn is_joined(&self, channel: &ChannelName) -> bool {
        self.joined.contains(channel)
    }

    /// Whether every sink of `source` is joined.
    pub fn is_satisfied(&self, source: &SourceName) -> bool {
        self.tables
            .sinks(source)
            .is_some_and(|sinks| sinks.is_subset(&self.joined))
    }

    /// Record a confirmed join and return the sources routed to `channel`
    /// whose sinks are now all joined.
    pub fn mark_joined(&mut self, channel: ChannelName) -> Vec<SourceName> {
        let ready = self
            .tables
            .sources_for_channel(&channel)
            .into_iter()
            .filter(|source| {
                self.tables.sinks(source).is_some_and(|sinks| {
                    sinks
                        .iter()
                        .all(|sink| sink == &channel || self.joined.contains(sink))
                })
            })
            .collect();
        self.joined.insert(channel);
        ready
    }

    /// Record that we left (or were removed from) `channel` and return the
    /// sources that post to it.
    pub fn mark_left(&mut self, channel: &ChannelName) -> Vec<SourceName> {
        self.joined.remove(channel);
        self.tables.sources_for_channel(channel)
    }

    /// Forget every membership, after the connection dropped.
    pub fn clear_joined(&mut self) {
        self.joined.clear();
    }

    /// Adopt `new` and describe how to get there from the current state.
    ///
    /// Joined channels are left as they are; carrying out the plan's leaves
    /// and joins is the caller's job, and the joins are only recorded once the
    /// transport confirms them.
    pub fn reload(&mut self, new: RelayTables) -> ReconcilePlan {
        let old_sources = self.tables.sources();
        let new_sources = new.sources();
        let old_sinks = self.tables.required_channels();
        let new_sinks = new.required_channels();

        let removed_sources: BTreeSet<_> = old_sources.difference(&new_sources).cloned().collect();
        let added_sources: BTreeSet<_> = new_sources.difference(&old_sources).cloned().collect();
        let persisting_sources: BTreeSet<_> =
            old_sources.intersection(&new_sources).cloned().collect();
        let removed_sinks: BTreeSet<_> = old_sinks.difference(&new_sinks).cloned().collect();
        let added_sinks: BTreeSet<_> = new_sinks.difference(&old_sinks).cloned().collect();

        self.tables = new;

        let suspended_sources = persisting_sources
            .iter()
            .filter(|source| !self.is_satisfied(source))
            .cloned()
            .collect();

        // A source waits for every one of its sinks, even when only some of
        // them are still pending a join.
        let start_now = added_sources
            .iter()
            .filter(|source| {
                self.tables.sinks(source).is_some_and(|sinks| {
                    sinks.is_subset(&self.joined) && !sinks.is_subset(&added_sinks)
                })
            })
            .cloned()
            .collect();

        ReconcilePlan {
            removed_sources,
            suspended_sources,
            persisting_sources,
            removed_sinks,
            start_now,
            added_sources,
            added_sinks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(routes: &str) -> RelayTables {
        RelayTables::parse(routes, "", "default: {user}").expect("Valid tables")
    }

    fn channel(name: &str) -> ChannelName {
        ChannelName::new(name).expect("Valid channel")
    }

    #[test]
    fn mark_joined_waits_for_every_sink() {
        let mut routing = RoutingTable::new(tables("a.org: #a #b"));
        assert!(routing.mark_joined(channel("#a")).is_empty());
        let ready = routing.mark_joined(channel("#b"));
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].as_str(), "a.org");
    }

    #[test]
    fn mark_left_reports_affected_sources() {
        let mut routing = RoutingTable::new(tables("a.org: #a\nb.org: #b"));
        routing.mark_joined(channel("#a"));
        routing.mark_joined(channel("#b"));
        let affected = routing.mark_left(&channel("#a"));
        assert_eq!(affected.len(), 1);
        assert!(!routing.is_joined(&channel("#a")));
        assert!(routing.is_joined(&channel("#b")));
    }
}

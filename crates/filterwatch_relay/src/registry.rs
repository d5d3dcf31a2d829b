//! Process-wide directory of running instances.

use crate::RelayHandle;
use filterwatch_core::Nick;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Every relay instance running in this process, keyed by nickname.
///
/// Cloning shares the same directory. A `rehash` uses it to reach every
/// instance that reads the same configuration file.
#[derive(Debug, Clone, Default)]
pub struct InstanceRegistry {
    instances: Arc<RwLock<BTreeMap<String, RelayHandle>>>,
}

impl InstanceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an instance.
    pub fn register(&self, handle: RelayHandle) {
        debug!(bot = %handle.nick(), "Registering instance");
        self.instances
            .write()
            .insert(handle.nick().to_string(), handle);
    }

    /// Remove an instance.
    pub fn unregister(&self, nick: &Nick) {
        debug!(bot = %nick, "Unregistering instance");
        self.instances.write().remove(nick.as_str());
    }

    /// Every instance other than `nick`.
    pub fn peers(&self, nick: &Nick) -> Vec<RelayHandle> {
        self.instances
            .read()
            .iter()
            .filter(|(name, _)| name.as_str() != nick.as_str())
            .map(|(_, handle)| handle.clone())
            .collect()
    }

    /// Registered nicknames.
    pub fn nicks(&self) -> Vec<String> {
        self.instances.read().keys().cloned().collect()
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    /// Whether no instance is registered.
    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }
}

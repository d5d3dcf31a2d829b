//! Reloadable configuration store shared by every instance in the process.

use crate::BotsConfig;
use filterwatch_error::ConfigError;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The bot file, re-readable on demand.
///
/// A failed [`reload`](ConfigStore::reload) leaves the current snapshot in
/// place, so readers of [`current`](ConfigStore::current) never observe a
/// half-applied configuration.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Arc<BotsConfig>>,
}

impl ConfigStore {
    /// Load the bot file at `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = BotsConfig::from_file(&path)?;
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// Path the store reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The most recently loaded configuration.
    pub fn current(&self) -> Arc<BotsConfig> {
        Arc::clone(&self.current.read())
    }

    /// Re-read the file and, if every instance it would start resolves, make
    /// it current.
    ///
    /// # Errors
    ///
    /// Returns error if the file was moved, deleted, unreadable, or invalid;
    /// the previous configuration stays current.
    pub fn reload(&self) -> Result<Arc<BotsConfig>, ConfigError> {
        self.reload_with(|_| Ok(())).map(|(config, ())| config)
    }

    /// Like [`reload`](Self::reload), but `check` must also accept the new
    /// configuration before it becomes current. Its output is returned with
    /// the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the load error or the error of `check`; the previous
    /// configuration stays current.
    #[tracing::instrument(skip_all, fields(path = %self.path.display()))]
    pub fn reload_with<T>(
        &self,
        check: impl FnOnce(&BotsConfig) -> Result<T, ConfigError>,
    ) -> Result<(Arc<BotsConfig>, T), ConfigError> {
        let loaded = BotsConfig::from_file(&self.path).and_then(|config| {
            config.startup_plan()?;
            let checked = check(&config)?;
            Ok((config, checked))
        });
        match loaded {
            Ok((config, checked)) => {
                let config = Arc::new(config);
                *self.current.write() = Arc::clone(&config);
                tracing::info!("Configuration reloaded");
                Ok((config, checked))
            }
            Err(e) => {
                tracing::error!(error = %e, "Configuration reload failed");
                Err(e)
            }
        }
    }
}

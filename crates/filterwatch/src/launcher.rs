//! Starting and stopping every configured instance.

use filterwatch_config::{ConfigStore, InstanceConfig, RoleConfig, StartupDecision};
use filterwatch_error::FilterwatchResult;
use filterwatch_interface::SourceConnector;
use filterwatch_irc::{IrcSettings, IrcTransport};
use filterwatch_relay::{InstanceRegistry, RelayCoordinator, RelayHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

/// How long to wait for one instance to finish shutting down.
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// IRC connection parameters of an instance.
pub fn irc_settings(instance: &InstanceConfig) -> IrcSettings {
    IrcSettings::builder()
        .host(instance.host())
        .port(instance.port())
        .ssl(instance.ssl())
        .nick(instance.nick().clone())
        .real_name(instance.real_name())
        .password(instance.password().map(str::to_string))
        .build()
}

/// One line per configured instance, for `--check`.
pub fn describe_plan(plan: &[StartupDecision]) -> Vec<String> {
    plan.iter()
        .map(|decision| match decision {
            StartupDecision::Start(instance) => format!(
                "start {} ({}:{}{}, {}, {} sources)",
                instance.nick(),
                instance.host(),
                instance.port(),
                if instance.ssl() { " tls" } else { "" },
                role_label(instance.role()),
                instance.tables().routes().len()
            ),
            StartupDecision::Skip { nick, reason } => format!("skip {}: {}", nick, reason),
        })
        .collect()
}

fn role_label(role: &RoleConfig) -> String {
    match role {
        RoleConfig::Master => "master".to_string(),
        RoleConfig::Slave { master, .. } => format!("slave of {}", master),
    }
}

struct RunningInstance {
    handle: RelayHandle,
    relay: JoinHandle<()>,
    connection: JoinHandle<()>,
}

/// Owns the running instances of one process.
pub struct Launcher {
    store: Arc<ConfigStore>,
    registry: InstanceRegistry,
    connector: Arc<dyn SourceConnector>,
    running: Vec<RunningInstance>,
}

impl Launcher {
    /// A launcher with nothing running yet.
    pub fn new(store: Arc<ConfigStore>, connector: Arc<dyn SourceConnector>) -> Self {
        Self {
            store,
            registry: InstanceRegistry::new(),
            connector,
            running: Vec::new(),
        }
    }

    /// Directory of the running instances.
    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    /// Number of instances started.
    pub fn len(&self) -> usize {
        self.running.len()
    }

    /// Whether nothing was started.
    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Start every instance the current configuration allows, logging the
    /// skipped ones.
    ///
    /// # Errors
    ///
    /// Returns the configuration error of the first instance that cannot be
    /// resolved. Nothing is started in that case.
    #[instrument(skip(self), fields(config = %self.store.path().display()))]
    pub fn launch(&mut self) -> FilterwatchResult<usize> {
        let plan = self.store.current().startup_plan()?;
        for decision in plan {
            match decision {
                StartupDecision::Start(instance) => self.start(*instance),
                StartupDecision::Skip { nick, reason } => {
                    info!(bot = %nick, reason = %reason, "Not starting instance");
                }
            }
        }
        Ok(self.running.len())
    }

    fn start(&mut self, instance: InstanceConfig) {
        let transport = Arc::new(IrcTransport::new(irc_settings(&instance)));
        let (coordinator, handle) = RelayCoordinator::new(
            instance,
            transport.clone(),
            Arc::clone(&self.connector),
            Arc::clone(&self.store),
            self.registry.clone(),
        );
        let connection = transport.spawn(handle.events());
        let relay = tokio::spawn(coordinator.run());
        info!(bot = %handle.nick(), "Instance started");
        self.running.push(RunningInstance {
            handle,
            relay,
            connection,
        });
    }

    /// Ask every instance to quit and wait for them.
    pub async fn shutdown(self) {
        for instance in &self.running {
            if let Err(e) = instance.handle.shutdown().await {
                warn!(bot = %instance.handle.nick(), error = %e, "Instance already stopped");
            }
        }

        for instance in self.running {
            let nick = instance.handle.nick().clone();
            if tokio::time::timeout(STOP_TIMEOUT, instance.relay).await.is_err() {
                warn!(bot = %nick, "Instance did not stop in time");
            }
            if tokio::time::timeout(STOP_TIMEOUT, instance.connection)
                .await
                .is_err()
            {
                warn!(bot = %nick, "Connection did not close in time");
            }
        }
        info!("All instances stopped");
    }
}

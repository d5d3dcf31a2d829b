//! One bot instance's main loop.

use crate::{
    Command, CommandInterpreter, InstanceRegistry, PollSettings, PollState, ReaderEvent,
    ReaderReport, ReconcilePlan, Role, RoleController, RoutingTable, SourceReader,
};
use filterwatch_config::{BotsConfig, ConfigStore, InstanceConfig};
use filterwatch_core::{ChannelName, Hostmask, Nick, SourceName};
use filterwatch_error::{RelayError, RelayErrorKind, SourceErrorKind};
use filterwatch_interface::{ChatTransport, Presence, SourceConnector, TransportEvent};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, trace, warn};

const QUIT_MESSAGE: &str = "Killed from console";
const CHANNEL_CAPACITY: usize = 64;

/// Twice the transport's two-second line rate.
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(4);

/// Control messages for a [`RelayCoordinator`].
#[derive(Debug)]
pub enum RelayMessage {
    /// Apply an already re-read configuration (a peer's rehash).
    ApplyConfig {
        /// The new snapshot.
        config: Arc<BotsConfig>,
        /// Receives the outcome.
        reply: oneshot::Sender<Result<(), RelayError>>,
    },
    /// A rehash this instance started has been applied everywhere it could be.
    RehashCompleted {
        /// Who asked for it.
        operator: Hostmask,
        /// Channel the command came from, if any.
        channel: Option<ChannelName>,
        /// `PartialReload` if some peers failed.
        outcome: Result<(), RelayError>,
    },
    /// Report the live state.
    Status {
        /// Receives the snapshot.
        reply: oneshot::Sender<RelayStatus>,
    },
    /// Stop every reader, quit and exit the loop.
    Shutdown,
}

/// A reader as seen from outside the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderStatus {
    /// Whether its poll task is alive.
    pub state: PollState,
    /// Highest entry id accounted for.
    pub watermark: Option<u64>,
}

/// Snapshot of an instance's live state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayStatus {
    /// Current role.
    pub role: Role,
    /// Channels confirmed joined.
    pub joined: BTreeSet<ChannelName>,
    /// Channels the routes require.
    pub required: BTreeSet<ChannelName>,
    /// Readers by source.
    pub readers: BTreeMap<SourceName, ReaderStatus>,
}

/// Cloneable address of a running [`RelayCoordinator`].
#[derive(Debug, Clone)]
pub struct RelayHandle {
    nick: Nick,
    inbox: mpsc::Sender<RelayMessage>,
    events: mpsc::Sender<TransportEvent>,
}

impl RelayHandle {
    /// Instance nickname.
    pub fn nick(&self) -> &Nick {
        &self.nick
    }

    /// Sender a transport delivers its notifications through.
    pub fn events(&self) -> mpsc::Sender<TransportEvent> {
        self.events.clone()
    }

    /// Deliver one transport notification.
    ///
    /// # Errors
    ///
    /// Returns `InstanceGone` if the main loop has exited.
    pub async fn notify(&self, event: TransportEvent) -> Result<(), RelayError> {
        self.events
            .send(event)
            .await
            .map_err(|_| self.gone())
    }

    /// Send a control message.
    ///
    /// # Errors
    ///
    /// Returns `InstanceGone` if the main loop has exited.
    pub async fn send(&self, message: RelayMessage) -> Result<(), RelayError> {
        self.inbox.send(message).await.map_err(|_| self.gone())
    }

    /// Ask the instance to shut down.
    ///
    /// # Errors
    ///
    /// Returns `InstanceGone` if the main loop has already exited.
    pub async fn shutdown(&self) -> Result<(), RelayError> {
        self.send(RelayMessage::Shutdown).await
    }

    /// Fetch a snapshot of the live state.
    ///
    /// # Errors
    ///
    /// Returns `InstanceGone` if the main loop has exited.
    pub async fn status(&self) -> Result<RelayStatus, RelayError> {
        let (reply, response) = oneshot::channel();
        self.send(RelayMessage::Status { reply }).await?;
        response.await.map_err(|_| self.gone())
    }

    /// Apply an already loaded configuration and wait for the outcome.
    ///
    /// # Errors
    ///
    /// Returns the instance's reload error, or `InstanceGone`.
    pub async fn apply_config(&self, config: Arc<BotsConfig>) -> Result<(), RelayError> {
        let (reply, response) = oneshot::channel();
        self.send(RelayMessage::ApplyConfig { config, reply }).await?;
        response.await.map_err(|_| self.gone())?
    }

    #[track_caller]
    fn gone(&self) -> RelayError {
        RelayError::new(RelayErrorKind::InstanceGone(self.nick.to_string()))
    }
}

/// Owns one instance's readers, routes and role, and serializes every change
/// to them on a single loop.
pub struct RelayCoordinator {
    config: InstanceConfig,
    store: Arc<ConfigStore>,
    registry: InstanceRegistry,
    transport: Arc<dyn ChatTransport>,
    connector: Arc<dyn SourceConnector>,
    routing: RoutingTable,
    role: RoleController,
    commands: CommandInterpreter,
    readers: BTreeMap<SourceName, SourceReader>,
    generation: u64,
    shutdown_grace: Duration,
    inbox: mpsc::Receiver<RelayMessage>,
    inbox_tx: mpsc::Sender<RelayMessage>,
    events: mpsc::Receiver<TransportEvent>,
    reports: mpsc::Receiver<ReaderReport>,
    reports_tx: mpsc::Sender<ReaderReport>,
}

impl RelayCoordinator {
    /// Create an instance and register it in `registry`.
    ///
    /// Nothing happens until [`run`](Self::run) is awaited and the transport
    /// reports [`TransportEvent::Connected`].
    pub fn new(
        config: InstanceConfig,
        transport: Arc<dyn ChatTransport>,
        connector: Arc<dyn SourceConnector>,
        store: Arc<ConfigStore>,
        registry: InstanceRegistry,
    ) -> (Self, RelayHandle) {
        let (inbox_tx, inbox) = mpsc::channel(CHANNEL_CAPACITY);
        let (events_tx, events) = mpsc::channel(CHANNEL_CAPACITY);
        let (reports_tx, reports) = mpsc::channel(CHANNEL_CAPACITY);

        let handle = RelayHandle {
            nick: config.nick().clone(),
            inbox: inbox_tx.clone(),
            events: events_tx,
        };
        registry.register(handle.clone());

        let coordinator = Self {
            routing: RoutingTable::new(config.tables().clone()),
            role: RoleController::new(config.role()),
            commands: CommandInterpreter::new(config.admin_hosts().to_vec()),
            config,
            store,
            registry,
            transport,
            connector,
            readers: BTreeMap::new(),
            generation: 0,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            inbox,
            inbox_tx,
            events,
            reports,
            reports_tx,
        };
        (coordinator, handle)
    }

    /// Override how long shutdown waits for the server to close the session.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Run until shut down.
    #[instrument(name = "relay", skip_all, fields(bot = %self.config.nick()))]
    pub async fn run(mut self) {
        info!(
            role = %self.role.role(),
            sources = self.routing.tables().routes().len(),
            "Relay started"
        );

        loop {
            tokio::select! {
                Some(message) = self.inbox.recv() => {
                    if self.handle_message(message).await.is_break() {
                        break;
                    }
                }
                Some(event) = self.events.recv() => self.handle_event(event).await,
                Some(report) = self.reports.recv() => self.handle_report(report).await,
                else => break,
            }
        }

        self.shutdown().await;
        self.registry.unregister(self.config.nick());
        info!("Relay stopped");
    }

    async fn handle_message(&mut self, message: RelayMessage) -> ControlFlow<()> {
        match message {
            RelayMessage::ApplyConfig { config, reply } => {
                let result = self.apply_config(&config).await.map(|_| ());
                if let Err(e) = &result {
                    error!(error = %e, "Configuration reload failed");
                }
                let _ = reply.send(result);
            }
            RelayMessage::RehashCompleted {
                operator,
                channel,
                outcome,
            } => {
                if let Err(e) = &outcome {
                    error!(error = %e, "Rehash did not reach every instance");
                }
                self.acknowledge(&operator, channel.as_ref(), &rehash_acknowledgement(&outcome))
                    .await;
            }
            RelayMessage::Status { reply } => {
                let _ = reply.send(self.status());
            }
            RelayMessage::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn status(&self) -> RelayStatus {
        RelayStatus {
            role: self.role.role(),
            joined: self.routing.joined().clone(),
            required: self.routing.required_channels(),
            readers: self
                .readers
                .iter()
                .map(|(source, reader)| {
                    (
                        source.clone(),
                        ReaderStatus {
                            state: reader.poll_state(),
                            watermark: reader.watermark(),
                        },
                    )
                })
                .collect(),
        }
    }

    async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                let channels = self.routing.required_channels();
                info!(channels = channels.len(), "Signed on, joining channels");
                for channel in &channels {
                    self.join(channel).await;
                }
            }
            TransportEvent::ConnectionLost { reason } => {
                warn!(reason = %reason, readers = self.readers.len(), "Connection lost");
                self.readers.clear();
                self.routing.clear_joined();
            }
            TransportEvent::JoinedChannel(channel) => self.channel_joined(channel).await,
            TransportEvent::LeftChannel(channel) => self.channel_left(channel).await,
            TransportEvent::UserPresence {
                nick,
                channel,
                presence,
            } => {
                let transition = match presence {
                    Presence::Joined => self.role.observe_join(&nick),
                    Presence::Left => self.role.observe_part(&nick),
                };
                if let Some(transition) = transition {
                    debug!(?transition, nick = %nick, channel = %channel, "Role changed on presence");
                }
            }
            TransportEvent::ChannelMembers { channel, nicks } => {
                if let Some(transition) = self.role.observe_members(&nicks) {
                    debug!(?transition, channel = %channel, members = nicks.len(), "Role changed on member list");
                }
            }
            TransportEvent::UserQuit { nick, message } => {
                if let Some(transition) = self.role.observe_quit(&nick) {
                    debug!(?transition, nick = %nick, message = %message, "Role changed on quit");
                }
            }
            TransportEvent::Line {
                sender,
                target,
                text,
            } => self.handle_line(sender, target, text).await,
        }
    }

    async fn channel_joined(&mut self, channel: ChannelName) {
        if !self.routing.is_required(&channel) {
            info!(channel = %channel, "Joined a channel no route uses, leaving");
            self.leave(&channel).await;
            return;
        }

        let ready = self.routing.mark_joined(channel.clone());
        info!(
            channel = %channel,
            sources = ?ready.iter().map(SourceName::as_str).collect::<Vec<_>>(),
            "Joined channel"
        );
        for source in ready {
            let running = self
                .readers
                .get(&source)
                .is_some_and(|reader| reader.poll_state() == PollState::Running);
            if !running {
                self.start_reader(&source);
            }
        }
    }

    async fn channel_left(&mut self, channel: ChannelName) {
        let affected = self.routing.mark_left(&channel);
        for source in &affected {
            if let Some(reader) = self.readers.get_mut(source) {
                reader.stop();
            }
        }
        if self.routing.is_required(&channel) {
            warn!(
                channel = %channel,
                paused = affected.len(),
                "Removed from a routed channel, rejoining"
            );
            self.join(&channel).await;
        }
    }

    async fn handle_line(&mut self, sender: Hostmask, target: String, text: String) {
        let own_nick = self.transport.current_nick();
        let Some(command) = self.commands.interpret(&own_nick, &sender, &text) else {
            return;
        };
        let channel = ChannelName::new(&target).ok();
        info!(operator = %sender, command = %command, "Operator command");

        match command {
            Command::Rehash => self.rehash(sender, channel).await,
            Command::Start => {
                let outcome = self.role.start();
                self.acknowledge(&sender, channel.as_ref(), &outcome.acknowledgement())
                    .await;
            }
            Command::Stop => {
                let outcome = self.role.stop();
                self.acknowledge(&sender, channel.as_ref(), &outcome.acknowledgement())
                    .await;
            }
        }
    }

    async fn rehash(&mut self, operator: Hostmask, channel: Option<ChannelName>) {
        // Our own section must resolve before the shared snapshot is swapped.
        let nick = self.config.nick().clone();
        let (snapshot, instance) = match self
            .store
            .reload_with(|config| config.instance(nick.as_str()))
        {
            Ok(loaded) => loaded,
            Err(e) => {
                let outcome = Err(RelayError::from(e));
                self.acknowledge(&operator, channel.as_ref(), &rehash_acknowledgement(&outcome))
                    .await;
                return;
            }
        };
        self.apply_instance(instance).await;

        let own = self.config.nick().to_string();
        let peers = self.registry.peers(self.config.nick());
        if peers.is_empty() {
            self.acknowledge(&operator, channel.as_ref(), &rehash_acknowledgement(&Ok(())))
                .await;
            return;
        }

        // Peers answer on their own loops; waiting here would block ours.
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let outcome = reload_peers(own, peers, snapshot).await;
            let _ = inbox
                .send(RelayMessage::RehashCompleted {
                    operator,
                    channel,
                    outcome,
                })
                .await;
        });
    }

    /// Reconcile against `snapshot`. Nothing changes if this instance's part
    /// of it does not resolve.
    async fn apply_config(&mut self, snapshot: &BotsConfig) -> Result<ReconcilePlan, RelayError> {
        let config = snapshot.instance(self.config.nick().as_str())?;
        Ok(self.apply_instance(config).await)
    }

    #[instrument(skip_all)]
    async fn apply_instance(&mut self, config: InstanceConfig) -> ReconcilePlan {
        let plan = self.routing.reload(config.tables().clone());
        self.commands.set_admin_hosts(config.admin_hosts().to_vec());
        self.config = config;

        info!(
            removed_sources = ?names(&plan.removed_sources),
            added_sources = ?names(&plan.added_sources),
            removed_channels = ?channels(&plan.removed_sinks),
            added_channels = ?channels(&plan.added_sinks),
            "Reconciling routes"
        );

        for source in &plan.removed_sources {
            if let Some(mut reader) = self.readers.remove(source) {
                reader.stop();
            }
        }
        for source in &plan.suspended_sources {
            if let Some(reader) = self.readers.get_mut(source) {
                debug!(source = %source, "Pausing reader until its channels are joined");
                reader.stop();
            }
        }

        for source in &plan.persisting_sources {
            let settings = self.routing.tables().settings(source).cloned();
            if let (Some(reader), Some(settings)) = (self.readers.get_mut(source), settings) {
                reader.update_settings(settings);
            }
        }

        for channel in &plan.removed_sinks {
            self.leave(channel).await;
        }

        for source in &plan.start_now {
            self.start_reader(source);
        }
        // Readers dropped after a login failure or a block get another try.
        let dormant: Vec<SourceName> = plan
            .persisting_sources
            .iter()
            .filter(|source| self.routing.is_satisfied(source))
            .filter(|source| {
                self.readers
                    .get(*source)
                    .is_none_or(|reader| reader.poll_state() == PollState::Stopped)
            })
            .cloned()
            .collect();
        for source in &dormant {
            self.start_reader(source);
        }

        for channel in &plan.added_sinks {
            self.join(channel).await;
        }

        plan
    }

    fn start_reader(&mut self, source: &SourceName) {
        let Some(settings) = self.routing.tables().settings(source).cloned() else {
            return;
        };
        let client = match self.connector.connect(source) {
            Ok(client) => client,
            Err(e) => {
                error!(source = %source, error = %e, "Cannot set up a client for this wiki");
                return;
            }
        };
        self.generation += 1;
        let generation = self.generation;
        let poll = PollSettings {
            bot: self.config.nick().clone(),
            credentials: self.config.credentials().clone(),
            interval: self.config.poll_interval(),
        };
        let reports = self.reports_tx.clone();

        let reader = self
            .readers
            .entry(source.clone())
            .or_insert_with(|| SourceReader::new(source.clone(), settings.clone()));
        reader.update_settings(settings);
        reader.start(client, poll, generation, reports);
        debug!(source = %source, generation, "Started reader");
    }

    async fn handle_report(&mut self, report: ReaderReport) {
        let Some(reader) = self.readers.get_mut(&report.source) else {
            trace!(source = %report.source, "Report for a discarded reader");
            return;
        };
        if !reader.accepts(report.generation) {
            trace!(source = %report.source, generation = report.generation, "Stale report");
            return;
        }

        match report.event {
            ReaderEvent::LoggedIn => {
                debug!(source = %report.source, "Reader logged in");
            }
            ReaderEvent::Batch(batch) => {
                let lines: Vec<String> = reader
                    .ingest(batch)
                    .iter()
                    .map(|entry| reader.render(entry))
                    .collect();
                self.post(&report.source, &lines).await;
            }
            ReaderEvent::Failed(e) => {
                self.readers.remove(&report.source);
                match e.kind {
                    SourceErrorKind::Blocked(_) => {
                        error!(source = %report.source, error = %e, "Blocked on this wiki, skipping it")
                    }
                    _ => error!(source = %report.source, error = %e, "Reader stopped"),
                }
            }
        }
    }

    async fn post(&self, source: &SourceName, lines: &[String]) {
        let Some(sinks) = self.routing.sinks(source) else {
            return;
        };
        for line in lines {
            for sink in sinks {
                if !self.role.may_post() {
                    trace!(source = %source, channel = %sink, "Suppressed while slave");
                    continue;
                }
                if let Err(e) = self.transport.send(sink.as_str(), line).await {
                    warn!(channel = %sink, error = %e, "Failed to post entry");
                }
            }
        }
    }

    /// Exactly one reply per command: in the channel if we are still there,
    /// otherwise privately.
    async fn acknowledge(&self, operator: &Hostmask, channel: Option<&ChannelName>, text: &str) {
        let result = match channel.filter(|channel| self.routing.is_joined(channel)) {
            Some(channel) => {
                let line = format!("{}: {}", operator.nick(), text);
                self.transport.send(channel.as_str(), &line).await
            }
            None => self.transport.send(operator.nick(), text).await,
        };
        if let Err(e) = result {
            warn!(operator = %operator, error = %e, "Failed to acknowledge command");
        }
    }

    async fn join(&self, channel: &ChannelName) {
        if let Err(e) = self.transport.join(channel).await {
            warn!(channel = %channel, error = %e, "Join failed");
        }
    }

    async fn leave(&mut self, channel: &ChannelName) {
        self.routing.mark_left(channel);
        if let Err(e) = self.transport.leave(channel).await {
            warn!(channel = %channel, error = %e, "Leave failed");
        }
    }

    async fn shutdown(&mut self) {
        info!(readers = self.readers.len(), "Shutting down");
        self.readers.clear();

        match self.transport.quit(QUIT_MESSAGE).await {
            Ok(()) => self.await_close().await,
            Err(e) => warn!(error = %e, "Quit failed"),
        }
        self.transport.disconnect().await;
    }

    async fn await_close(&mut self) {
        let grace = tokio::time::sleep(self.shutdown_grace);
        tokio::pin!(grace);
        loop {
            tokio::select! {
                _ = &mut grace => {
                    debug!("Grace period elapsed, closing connection");
                    break;
                }
                event = self.events.recv() => match event {
                    Some(TransportEvent::ConnectionLost { .. }) | None => break,
                    Some(_) => {}
                },
            }
        }
    }
}

async fn reload_peers(
    own: String,
    peers: Vec<RelayHandle>,
    snapshot: Arc<BotsConfig>,
) -> Result<(), RelayError> {
    let mut reloaded = vec![own];
    let mut failed = Vec::new();
    for peer in peers {
        match peer.apply_config(Arc::clone(&snapshot)).await {
            Ok(()) => reloaded.push(peer.nick().to_string()),
            Err(e) => {
                warn!(bot = %peer.nick(), error = %e, "Peer failed to reload");
                failed.push(peer.nick().to_string());
            }
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(RelayError::new(RelayErrorKind::PartialReload { reloaded, failed }))
    }
}

fn rehash_acknowledgement(outcome: &Result<(), RelayError>) -> String {
    match outcome {
        Ok(()) => "configuration was reloaded successfully.".to_string(),
        Err(e) => match &e.kind {
            RelayErrorKind::PartialReload { reloaded, failed } => format!(
                "configuration reloaded on {} but failed on {} :-(.  An error was logged.",
                reloaded.join(", "),
                failed.join(", ")
            ),
            _ => "configuration reload failed :-(.  An error was logged.".to_string(),
        },
    }
}

fn names(sources: &BTreeSet<SourceName>) -> Vec<&str> {
    sources.iter().map(SourceName::as_str).collect()
}

fn channels(sinks: &BTreeSet<ChannelName>) -> Vec<&str> {
    sinks.iter().map(ChannelName::as_str).collect()
}

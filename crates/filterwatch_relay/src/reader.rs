//! Per-wiki abuse-log polling.

use filterwatch_config::{SourceSettings, WikiCredentials};
use filterwatch_core::{LogEntry, Nick, SourceName};
use filterwatch_error::SourceError;
use filterwatch_interface::LogSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

/// Whether a reader's poll task is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PollState {
    /// No poll task.
    Stopped,
    /// A poll task is logging in or fetching on its interval.
    Running,
}

/// What a poll task observed.
#[derive(Debug)]
pub enum ReaderEvent {
    /// Login succeeded; the first batch follows.
    LoggedIn,
    /// One fetch's raw result, in wiki order.
    Batch(Vec<LogEntry>),
    /// A permanent failure; the task has exited.
    Failed(SourceError),
}

/// A message from a poll task to the coordinator's main loop.
#[derive(Debug)]
pub struct ReaderReport {
    /// Wiki the task polls.
    pub source: SourceName,
    /// Generation the task was started with.
    pub generation: u64,
    /// What happened.
    pub event: ReaderEvent,
}

/// Everything a poll task needs besides its source.
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Instance nickname, for log context.
    pub bot: Nick,
    /// Wiki login.
    pub credentials: WikiCredentials,
    /// Delay between the end of one fetch and the start of the next.
    pub interval: Duration,
}

/// One wiki's reader.
///
/// The network side runs in a spawned poll task that only ever ships raw
/// batches back. Deduplication, ordering and exclusion happen in
/// [`ingest`](SourceReader::ingest) on the coordinator's main loop, so the
/// watermark is never touched concurrently.
#[derive(Debug)]
pub struct SourceReader {
    source: SourceName,
    settings: SourceSettings,
    watermark: Option<u64>,
    primed: bool,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl SourceReader {
    /// A stopped reader with no watermark.
    pub fn new(source: SourceName, settings: SourceSettings) -> Self {
        Self {
            source,
            settings,
            watermark: None,
            primed: false,
            generation: 0,
            task: None,
        }
    }

    /// Wiki this reader polls.
    pub fn source(&self) -> &SourceName {
        &self.source
    }

    /// Exclusions and template currently in force.
    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    /// Highest entry id already accounted for.
    pub fn watermark(&self) -> Option<u64> {
        self.watermark
    }

    /// Whether the first batch has been seen.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Generation of the current (or last) poll task.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a poll task is alive.
    pub fn poll_state(&self) -> PollState {
        match &self.task {
            Some(task) if !task.is_finished() => PollState::Running,
            _ => PollState::Stopped,
        }
    }

    /// Swap in reloaded exclusions and template. The watermark is kept.
    pub fn update_settings(&mut self, settings: SourceSettings) {
        self.settings = settings;
    }

    /// Whether a report from a task of `generation` is still meaningful.
    pub fn accepts(&self, generation: u64) -> bool {
        self.task.is_some() && self.generation == generation
    }

    /// Fold one raw batch into the reader and return what should be posted.
    ///
    /// The batch is sorted ascending; entries at or below the watermark are
    /// dropped; the watermark rises to the highest remaining id; excluded
    /// filters are dropped last so they still advance the watermark. The first
    /// batch ever ingested only establishes the watermark.
    pub fn ingest(&mut self, mut batch: Vec<LogEntry>) -> Vec<LogEntry> {
        batch.sort_by_key(|entry| entry.id);
        batch.dedup_by_key(|entry| entry.id);

        if let Some(mark) = self.watermark {
            batch.retain(|entry| entry.id > mark);
        }
        if let Some(last) = batch.last() {
            self.watermark = Some(last.id);
        }

        if !self.primed {
            self.primed = true;
            debug!(
                source = %self.source,
                watermark = ?self.watermark,
                "Reader initialized"
            );
            return Vec::new();
        }

        let excluded = self.settings.excluded_filters();
        batch.retain(|entry| !excluded.contains(&entry.filter_id));
        batch
    }

    /// Render an entry with this source's template.
    pub fn render(&self, entry: &LogEntry) -> String {
        self.settings.template().render(entry, &self.source)
    }

    /// Spawn a poll task against `client`, replacing any previous one.
    ///
    /// The watermark survives a restart, so a reader stopped while one of its
    /// channels was rejoined picks up where it left off.
    pub fn start(
        &mut self,
        client: Arc<dyn LogSource>,
        settings: PollSettings,
        generation: u64,
        reports: mpsc::Sender<ReaderReport>,
    ) {
        self.stop();
        self.generation = generation;
        self.task = Some(tokio::spawn(poll(client, settings, generation, reports)));
    }

    /// Abort the poll task, if any. Idempotent.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SourceReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Log in, then fetch once per interval until aborted or permanently failed.
///
/// The interval is not re-armed until the current fetch returns, so at most
/// one request per source is in flight.
#[instrument(name = "reader", skip_all, fields(bot = %settings.bot, source = %client.name()))]
async fn poll(
    client: Arc<dyn LogSource>,
    settings: PollSettings,
    generation: u64,
    reports: mpsc::Sender<ReaderReport>,
) {
    let source = client.name().clone();
    let report = |event| ReaderReport {
        source: source.clone(),
        generation,
        event,
    };

    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match client
            .authenticate(&settings.credentials.user, &settings.credentials.password)
            .await
        {
            Ok(()) => break,
            Err(e) if e.is_permanent() => {
                let _ = reports.send(report(ReaderEvent::Failed(e))).await;
                return;
            }
            Err(e) => debug!(error = %e, "Login failed, retrying next interval"),
        }
    }

    info!("Logged in");
    if reports.send(report(ReaderEvent::LoggedIn)).await.is_err() {
        return;
    }

    loop {
        match client.fetch_recent().await {
            Ok(batch) => {
                debug!(entries = batch.len(), "Fetched abuse log");
                if reports.send(report(ReaderEvent::Batch(batch))).await.is_err() {
                    return;
                }
            }
            Err(e) if e.is_permanent() => {
                let _ = reports.send(report(ReaderEvent::Failed(e))).await;
                return;
            }
            Err(e) => debug!(error = %e, "Fetch failed, skipping this cycle"),
        }
        ticker.tick().await;
    }
}

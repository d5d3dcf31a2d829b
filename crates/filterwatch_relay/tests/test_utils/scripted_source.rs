//! Log sources that replay scripted fetch results.

use async_trait::async_trait;
use filterwatch_core::{LogEntry, SourceName};
use filterwatch_error::{SourceError, SourceErrorKind};
use filterwatch_interface::{LogSource, SourceConnector};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source returning queued results, then empty batches.
#[derive(Debug)]
pub struct ScriptedSource {
    name: SourceName,
    login: Mutex<Result<(), SourceError>>,
    script: Mutex<VecDeque<Result<Vec<LogEntry>, SourceError>>>,
    logins: AtomicUsize,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: SourceName::new(name).expect("Valid source"),
            login: Mutex::new(Ok(())),
            script: Mutex::new(VecDeque::new()),
            logins: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn reject_login(&self, kind: SourceErrorKind) {
        *self.login.lock() = Err(SourceError::new(kind));
    }

    pub fn accept_login(&self) {
        *self.login.lock() = Ok(());
    }

    pub fn push(&self, batch: Vec<LogEntry>) {
        self.script.lock().push_back(Ok(batch));
    }

    pub fn push_error(&self, kind: SourceErrorKind) {
        self.script.lock().push_back(Err(SourceError::new(kind)));
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogSource for ScriptedSource {
    fn name(&self) -> &SourceName {
        &self.name
    }

    async fn authenticate(&self, _user: &str, _secret: &str) -> Result<(), SourceError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        self.login.lock().clone()
    }

    async fn fetch_recent(&self) -> Result<Vec<LogEntry>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.script.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Connector handing out pre-registered scripted sources.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    sources: Mutex<BTreeMap<String, Arc<ScriptedSource>>>,
    connects: Mutex<Vec<String>>,
}

impl ScriptedConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add(&self, source: Arc<ScriptedSource>) {
        self.sources
            .lock()
            .insert(source.name().to_string(), source);
    }

    pub fn source(&self, name: &str) -> Arc<ScriptedSource> {
        let mut sources = self.sources.lock();
        Arc::clone(
            sources
                .entry(name.to_string())
                .or_insert_with(|| ScriptedSource::new(name)),
        )
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().clone()
    }
}

impl SourceConnector for ScriptedConnector {
    fn connect(&self, source: &SourceName) -> Result<Arc<dyn LogSource>, SourceError> {
        self.connects.lock().push(source.to_string());
        Ok(self.source(source.as_str()))
    }
}

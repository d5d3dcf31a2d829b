//! Test utilities for relay tests.
//!
//! Mock collaborators and helpers shared by the integration tests.

#![allow(dead_code)]

pub mod mock_transport;
pub mod scripted_source;

pub use mock_transport::{MockTransport, TransportCall};
pub use scripted_source::{ScriptedConnector, ScriptedSource};

use filterwatch_core::{ChannelName, Hostmask, LogEntry, LogEntryBuilder, SourceName};
use filterwatch_relay::{RelayHandle, RelayStatus};
use std::time::Duration;
use tokio::time::Instant;

/// Paused time a wait helper may spend; several poll intervals.
const WAIT_BUDGET: Duration = Duration::from_secs(60);
const WAIT_STEP: Duration = Duration::from_millis(20);

/// Build a log entry with the fields tests care about.
pub fn entry(id: u64, filter_id: &str) -> LogEntry {
    LogEntryBuilder::default()
        .id(id)
        .filter_id(filter_id)
        .user("Vandal")
        .page("Main Page")
        .action("edit")
        .result("disallow")
        .build()
        .expect("Valid log entry")
}

pub fn source(name: &str) -> SourceName {
    SourceName::new(name).expect("Valid source")
}

pub fn channel(name: &str) -> ChannelName {
    ChannelName::new(name).expect("Valid channel")
}

pub fn operator() -> Hostmask {
    Hostmask::parse("alice!alice@ops.example.org").expect("Valid hostmask")
}

pub fn stranger() -> Hostmask {
    Hostmask::parse("mallory!m@evil.example.com").expect("Valid hostmask")
}

/// Poll the instance until `predicate` holds, letting paused time advance.
pub async fn wait_for_status(
    handle: &RelayHandle,
    predicate: impl Fn(&RelayStatus) -> bool,
) -> RelayStatus {
    let deadline = Instant::now() + WAIT_BUDGET;
    while Instant::now() < deadline {
        let status = handle.status().await.expect("Instance running");
        if predicate(&status) {
            return status;
        }
        tokio::time::sleep(WAIT_STEP).await;
    }
    panic!("Timed out waiting for relay status");
}

/// Wait until at least `count` lines were sent to `target`.
pub async fn wait_for_sends(transport: &MockTransport, target: &str, count: usize) -> Vec<String> {
    let deadline = Instant::now() + WAIT_BUDGET;
    while Instant::now() < deadline {
        let sent = transport.sent_to(target);
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(WAIT_STEP).await;
    }
    panic!(
        "Timed out waiting for {} lines to {}; got {:?}",
        count,
        target,
        transport.sent_to(target)
    );
}

/// Let every task run for a while of (paused) time.
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(3)).await;
}

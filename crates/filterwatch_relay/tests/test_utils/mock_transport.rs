//! Recording chat transport.

use async_trait::async_trait;
use filterwatch_core::{ChannelName, Nick};
use filterwatch_error::TransportError;
use filterwatch_interface::ChatTransport;
use parking_lot::Mutex;

/// One call made on the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Join(String),
    Leave(String),
    Send { target: String, text: String },
    SetIdentity(String),
    Quit(String),
    Disconnect,
}

/// Transport that records every call and always succeeds.
#[derive(Debug)]
pub struct MockTransport {
    nick: Mutex<Nick>,
    calls: Mutex<Vec<TransportCall>>,
}

impl MockTransport {
    pub fn new(nick: &str) -> Self {
        Self {
            nick: Mutex::new(Nick::new(nick).expect("Valid nick")),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    pub fn sent_to(&self, target: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::Send { target: t, text } if t == target => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn sends(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, TransportCall::Send { .. }))
            .count()
    }

    pub fn joins(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::Join(channel) => Some(channel.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn leaves(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::Leave(channel) => Some(channel.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn join(&self, channel: &ChannelName) -> Result<(), TransportError> {
        self.calls
            .lock()
            .push(TransportCall::Join(channel.to_string()));
        Ok(())
    }

    async fn leave(&self, channel: &ChannelName) -> Result<(), TransportError> {
        self.calls
            .lock()
            .push(TransportCall::Leave(channel.to_string()));
        Ok(())
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), TransportError> {
        self.calls.lock().push(TransportCall::Send {
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn set_identity(&self, nick: &Nick) -> Result<(), TransportError> {
        *self.nick.lock() = nick.clone();
        self.calls
            .lock()
            .push(TransportCall::SetIdentity(nick.to_string()));
        Ok(())
    }

    async fn quit(&self, message: &str) -> Result<(), TransportError> {
        self.calls
            .lock()
            .push(TransportCall::Quit(message.to_string()));
        Ok(())
    }

    async fn disconnect(&self) {
        self.calls.lock().push(TransportCall::Disconnect);
    }

    fn current_nick(&self) -> Nick {
        self.nick.lock().clone()
    }
}

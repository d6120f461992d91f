//! Command channel into the console task.
//!
//! Everything that mutates console state (inbound events, dismissals,
//! transport notices, shutdown) travels through this channel so a single task
//! applies it in order.

use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{ConsoleError, Result};
use crate::log_queue::LogId;
use crate::transport::EventSink;

/// Messages processed by [`Console::run`](super::Console::run)
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// A raw `(topic, payload)` pair from the transport layer
    Event { topic: String, payload: String },
    /// Operator dismissed a log entry
    Dismiss(LogId),
    /// No event source could be started
    TransportUnavailable(String),
    Shutdown,
}

/// Cloneable sender side of the console command channel
#[derive(Debug, Clone)]
pub struct ConsoleHandle {
    tx: mpsc::Sender<ConsoleCommand>,
}

/// Create the console command channel
///
/// # Arguments
///
/// * `capacity` - Number of commands buffered before inbound events are dropped
pub fn command_channel(capacity: usize) -> (ConsoleHandle, mpsc::Receiver<ConsoleCommand>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ConsoleHandle { tx }, rx)
}

impl ConsoleHandle {
    /// Queue an inbound event without waiting
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::ChannelFull`] if the console is behind (the event
    /// is dropped) or [`ConsoleError::ChannelClosed`] if it has stopped.
    pub fn send_event(&self, topic: &str, payload: String) -> Result<()> {
        self.tx
            .try_send(ConsoleCommand::Event {
                topic: topic.to_string(),
                payload,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => ConsoleError::ChannelFull(topic.to_string()),
                mpsc::error::TrySendError::Closed(_) => ConsoleError::ChannelClosed,
            })
    }

    pub async fn dismiss(&self, id: LogId) -> Result<()> {
        self.send(ConsoleCommand::Dismiss(id)).await
    }

    pub async fn transport_unavailable(&self, reason: impl Into<String>) -> Result<()> {
        self.send(ConsoleCommand::TransportUnavailable(reason.into())).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(ConsoleCommand::Shutdown).await
    }

    async fn send(&self, command: ConsoleCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| ConsoleError::ChannelClosed)
    }
}

impl EventSink for ConsoleHandle {
    fn emit(&self, topic: &str, payload: String) -> Result<()> {
        let result = self.send_event(topic, payload);
        if let Err(ConsoleError::ChannelFull(_)) = &result {
            warn!("Console is not keeping up, dropping event on '{}'", topic);
        }
        result
    }
}

//! # Console Module
//!
//! The coordinating task that owns all operator-facing state.
//!
//! This module handles:
//! - Running each inbound payload through decode, classify, merge/format
//! - Owning the telemetry snapshot, map position, log queue and connection latch
//! - Applying expiry timer firings and operator dismissals in arrival order
//! - Publishing a [`ConsoleView`] to observers after every change
//!
//! All mutations happen on the task running [`Console::run`]; other tasks
//! talk to it through a [`ConsoleHandle`].

pub mod connection;
pub mod handle;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::event::{classify, decode, format_event, Classified, DecodeFailure, DecodeResult};
use crate::log_queue::{LogEntry, LogId, LogQueue, Severity};
use crate::telemetry::display::{battery_band, battery_gauge_percent, cardinal_direction};
use crate::telemetry::{merge, update_position, Position, TelemetrySnapshot, TelemetryUpdate};

pub use connection::{ConnectionStatus, ConnectionTracker};
pub use handle::{command_channel, ConsoleCommand, ConsoleHandle};

/// Subsystem tag of console-generated entries
const CONSOLE_SUBSYSTEM: &str = "SYSTEM";

/// Everything an operator view renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsoleView {
    pub snapshot: TelemetrySnapshot,
    pub position: Position,
    pub connection: ConnectionStatus,
    pub degraded: bool,
    /// Visible log entries, oldest first
    pub entries: Vec<LogEntry>,
}

impl ConsoleView {
    /// One-line status overlay text
    ///
    /// Battery is clamped for display only; the snapshot keeps the raw value.
    pub fn summary(&self) -> String {
        let snapshot = &self.snapshot;
        let battery = battery_gauge_percent(snapshot.battery);
        let mut line = format!(
            "{} | {} | ALT {:.0}m | SPD {:.1}m/s | HDG {:.0} {} | BAT {:.0}% {} | GPS {} | {:.6}, {:.6} | {} logs",
            self.connection.label(),
            snapshot.status,
            snapshot.altitude,
            snapshot.speed,
            snapshot.heading,
            cardinal_direction(snapshot.heading),
            battery,
            battery_band(battery).label(),
            if snapshot.gps_fix { "FIX" } else { "NO FIX" },
            self.position.lat,
            self.position.lon,
            self.entries.len(),
        );
        if self.degraded {
            line.push_str(" | DEGRADED");
        }
        line
    }

    /// Visible entries rendered as `icon message`, oldest first
    pub fn log_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| format!("{} {}", entry.severity.icon(), entry.message))
            .collect()
    }
}

/// Pipeline counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PipelineStats {
    /// Envelopes that made it through decoding
    pub envelopes: u64,
    pub telemetry_updates: u64,
    pub subsystem_events: u64,
    /// Payloads dropped as malformed JSON
    pub decode_failures: u64,
    /// Subsystem events whose nested command could not be decoded
    pub degraded_commands: u64,
    pub ignored_topics: u64,
}

/// What happened to one inbound payload
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Merged into the snapshot
    Telemetry,
    /// Formatted into a new log entry
    Subsystem(LogId),
    /// Malformed; nothing changed
    Dropped(DecodeFailure),
    /// Not on the console topic
    IgnoredTopic,
}

/// Single owner of snapshot, position, log feed and connection status
#[derive(Debug)]
pub struct Console {
    topic: String,
    snapshot: TelemetrySnapshot,
    position: Position,
    logs: LogQueue,
    expiry_rx: mpsc::UnboundedReceiver<LogId>,
    connection: ConnectionTracker,
    stats: PipelineStats,
    view_tx: watch::Sender<ConsoleView>,
}

impl Console {
    /// Create a console in its initial, disconnected state
    pub fn new(config: &Config) -> Self {
        let (logs, expiry_rx) = LogQueue::new(
            config.log_queue.capacity,
            Duration::from_millis(config.log_queue.ttl_ms),
        );
        let snapshot = TelemetrySnapshot::from_config(&config.telemetry);
        let position = Position::from_config(&config.telemetry);

        let initial_view = ConsoleView {
            snapshot: snapshot.clone(),
            position,
            connection: ConnectionStatus::Disconnected,
            degraded: false,
            entries: Vec::new(),
        };
        let (view_tx, _) = watch::channel(initial_view);

        Self {
            topic: config.console.topic.clone(),
            snapshot,
            position,
            logs,
            expiry_rx,
            connection: ConnectionTracker::new(),
            stats: PipelineStats::default(),
            view_tx,
        }
    }

    /// Observe console state; the receiver sees the latest view after each change
    pub fn subscribe(&self) -> watch::Receiver<ConsoleView> {
        self.view_tx.subscribe()
    }

    /// Process commands and expiry timers until shutdown
    ///
    /// Returns the pipeline counters. All pending log timers are cancelled on
    /// the way out, whether the loop ended by command or by every handle
    /// being dropped.
    pub async fn run(mut self, mut commands: mpsc::Receiver<ConsoleCommand>) -> PipelineStats {
        info!("Console running on topic '{}'", self.topic);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(ConsoleCommand::Event { topic, payload }) => {
                        self.handle_event(&topic, &payload);
                    }
                    Some(ConsoleCommand::Dismiss(id)) => {
                        self.dismiss(id);
                    }
                    Some(ConsoleCommand::TransportUnavailable(reason)) => {
                        self.transport_unavailable(&reason);
                    }
                    Some(ConsoleCommand::Shutdown) | None => break,
                },
                Some(id) = self.expiry_rx.recv() => {
                    self.expire(id);
                }
            }
        }

        self.shutdown()
    }

    /// Run one `(topic, payload)` pair through the pipeline
    pub fn handle_event(&mut self, topic: &str, payload: &str) -> Outcome {
        if topic != self.topic {
            debug!("Ignoring event on topic '{}'", topic);
            self.stats.ignored_topics += 1;
            return Outcome::IgnoredTopic;
        }

        let event = match decode(payload) {
            DecodeResult::Ok(event) => event,
            DecodeResult::Degraded(event, failure) => {
                warn!("{}: {} (using empty event descriptor)", failure.code(), failure);
                self.stats.degraded_commands += 1;
                event
            }
            DecodeResult::Failed(failure) => {
                warn!("{}: {}", failure.code(), failure);
                debug!("Raw payload: {}", payload);
                self.stats.decode_failures += 1;
                return Outcome::Dropped(failure);
            }
        };

        self.stats.envelopes += 1;
        let classified = classify(event);
        self.mark_connected();

        let outcome = match classified {
            Classified::Telemetry(update) => {
                self.apply_telemetry(&update);
                Outcome::Telemetry
            }
            Classified::Subsystem(descriptor) => {
                self.stats.subsystem_events += 1;
                let entry = format_event(&descriptor).into_entry();
                let id = entry.id;
                self.push_entry(entry);
                Outcome::Subsystem(id)
            }
        };

        self.publish();
        outcome
    }

    /// Operator dismissal; no-op if the entry is already gone
    pub fn dismiss(&mut self, id: LogId) -> Option<LogEntry> {
        let removed = self.logs.dismiss(id);
        if removed.is_some() {
            debug!("Dismissed log entry {}", id);
            self.publish();
        }
        removed
    }

    /// Expiry timer fired; no-op if the entry is already gone
    pub fn expire(&mut self, id: LogId) -> Option<LogEntry> {
        let removed = self.logs.expire(id);
        if removed.is_some() {
            debug!("Log entry {} expired", id);
            self.publish();
        }
        removed
    }

    /// Fall back to a degraded connected state when no event source exists
    pub fn transport_unavailable(&mut self, reason: &str) {
        warn!("TRANSPORT_UNAVAILABLE: {} (continuing in degraded mode)", reason);
        if self.connection.mark_transport_unavailable() {
            self.announce_connection();
        }
        self.publish();
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn connection(&self) -> &ConnectionTracker {
        &self.connection
    }

    pub fn logs(&self) -> &LogQueue {
        &self.logs
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn view(&self) -> ConsoleView {
        ConsoleView {
            snapshot: self.snapshot.clone(),
            position: self.position,
            connection: self.connection.status(),
            degraded: self.connection.is_degraded(),
            entries: self.logs.entries().cloned().collect(),
        }
    }

    fn apply_telemetry(&mut self, update: &TelemetryUpdate) {
        self.stats.telemetry_updates += 1;
        self.snapshot = merge(std::mem::take(&mut self.snapshot), update);

        let previous = self.position;
        self.position = update_position(previous, update);
        if self.position != previous {
            debug!("New position: {:.6}, {:.6}", self.position.lat, self.position.lon);
        }
    }

    fn mark_connected(&mut self) {
        if self.connection.mark_connected() {
            self.announce_connection();
        }
    }

    fn announce_connection(&mut self) {
        info!("Connection status: {}", ConnectionStatus::Connected.label());
        let message = format!("{}: {}", CONSOLE_SUBSYSTEM, ConnectionStatus::Connected.label());
        self.push_entry(LogEntry::new(message, Severity::Info));
    }

    fn push_entry(&mut self, entry: LogEntry) {
        info!("[{}] {}", entry.severity, entry.message);
        for evicted in self.logs.push(entry) {
            debug!("Log entry {} dropped to stay within capacity", evicted.id);
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }

    fn shutdown(mut self) -> PipelineStats {
        self.logs.clear();
        self.publish();

        let stats = self.stats;
        info!(
            "Console stopped: {} envelopes ({} telemetry, {} subsystem), {} malformed, {} degraded, {} ignored",
            stats.envelopes,
            stats.telemetry_updates,
            stats.subsystem_events,
            stats.decode_failures,
            stats.degraded_commands,
            stats.ignored_topics
        );
        stats
    }
}

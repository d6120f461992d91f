//! # Subsystem-Event Formatter
//!
//! Turns a subsystem event descriptor into a one-line toast message:
//!
//! ```text
//! {SUBSYSTEM}: {details or Title Cased Event} (Label: value, Label: value)
//! ```
//!
//! At most [`MAX_DATA_FRAGMENTS`] data points are shown. Which ones win is
//! decided by the order of [`DATA_POINT_KEYS`], not by key order in the
//! upstream object.

use serde_json::Value;

use super::envelope::EventDescriptor;
use crate::log_queue::{LogEntry, Severity};

/// Subsystem label used when the event names none
pub const DEFAULT_SUBSYSTEM: &str = "SYSTEM";

/// Base message used when the event has neither details nor a name
pub const UNKNOWN_EVENT: &str = "Unknown Event";

/// Maximum number of data points appended to a message
pub const MAX_DATA_FRAGMENTS: usize = 2;

/// Well-known data point keys and their labels, in priority order
pub const DATA_POINT_KEYS: &[(&str, &str)] = &[
    // Imaging
    ("scan_area", "Scan Area"),
    ("resolution", "Resolution"),
    ("fps", "FPS"),
    ("file_size", "File Size"),
    ("location", "Location"),
    ("max_temp", "Max Temp"),
    ("min_temp", "Min Temp"),
    ("anomalies", "Anomalies"),
    ("pitch_range", "Pitch Range"),
    ("yaw_range", "Yaw Range"),
    // Sensors
    ("accuracy", "Accuracy"),
    ("deviation", "Deviation"),
    ("pressure", "Pressure"),
    ("altitude", "Altitude"),
    // Comms
    ("bandwidth", "Bandwidth"),
    ("latency", "Latency"),
    ("packets", "Packets"),
    ("size", "Size"),
    // Mission
    ("waypoint", "Waypoint"),
    ("eta_next", "ETA Next"),
    ("coverage", "Coverage"),
    ("images", "Images"),
    ("distance", "Distance"),
    ("boundary", "Boundary"),
    // Health
    ("available", "Available"),
    ("used", "Used"),
    ("level", "Level"),
    ("threshold", "Threshold"),
    ("temp", "Temp"),
    ("limit", "Limit"),
    ("satellites", "Satellites"),
    ("strength", "Strength"),
    ("backup_status", "Backup Status"),
    ("data_loss", "Data Loss"),
    // Power and safety
    ("voltage", "Voltage"),
    ("expected", "Expected"),
    ("reason", "Reason"),
    ("eta", "ETA"),
];

/// Display-ready form of a subsystem event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedEvent {
    pub message: String,
    pub severity: Severity,
}

impl FormattedEvent {
    /// Stamp the formatted event as a new log entry
    pub fn into_entry(self) -> LogEntry {
        LogEntry::new(self.message, self.severity)
    }
}

/// Format a subsystem event for the log feed
///
/// # Examples
///
/// ```
/// use operator_console::event::envelope::EventDescriptor;
/// use operator_console::event::formatter::format_event;
/// use operator_console::log_queue::Severity;
///
/// let formatted = format_event(&EventDescriptor::default());
/// assert_eq!(formatted.message, "SYSTEM: Unknown Event");
/// assert_eq!(formatted.severity, Severity::Info);
/// ```
pub fn format_event(descriptor: &EventDescriptor) -> FormattedEvent {
    let base = match non_blank(descriptor.details.as_deref()) {
        Some(details) => details.to_string(),
        None => non_blank(descriptor.event.as_deref())
            .map(title_case)
            .unwrap_or_else(|| UNKNOWN_EVENT.to_string()),
    };

    let fragments: Vec<String> = DATA_POINT_KEYS
        .iter()
        .filter_map(|(key, label)| {
            descriptor
                .data
                .get(*key)
                .and_then(data_point_value)
                .map(|value| format!("{}: {}", label, value))
        })
        .take(MAX_DATA_FRAGMENTS)
        .collect();

    let subsystem = non_blank(descriptor.subsystem.as_deref()).unwrap_or(DEFAULT_SUBSYSTEM);

    let message = if fragments.is_empty() {
        format!("{}: {}", subsystem, base)
    } else {
        format!("{}: {} ({})", subsystem, base, fragments.join(", "))
    };

    let severity = descriptor
        .level
        .as_deref()
        .and_then(Severity::parse)
        .unwrap_or_default();

    FormattedEvent { message, severity }
}

/// `LOW_STORAGE_WARNING` -> `Low Storage Warning`
#[must_use]
pub fn title_case(event: &str) -> String {
    event
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Render a scalar data point; null, blank and structured values are skipped
fn data_point_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

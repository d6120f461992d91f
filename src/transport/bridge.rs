//! # Envelope Bridge
//!
//! Wraps raw upstream traffic into backend event envelopes.
//!
//! - UDP telemetry datagrams are JSON packets tagged with `packet_type`
//!   (HEARTBEAT, GLOBAL_POSITION_INT, ATTITUDE, SYS_STATUS, ...). Known
//!   telemetry fields are copied under `data` of a `DRONE` envelope.
//! - TCP payload traffic is line oriented. Each line is carried verbatim
//!   as `data.command` of a `PAYLOAD` envelope; the console decodes it later.

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::event::envelope::{RawEnvelope, DRONE_SOURCE, PAYLOAD_SOURCE};

/// Telemetry packet fields forwarded to the console
pub const TELEMETRY_FIELDS: &[&str] = &[
    "lat",
    "lon",
    "alt",
    "vx",
    "vy",
    "vz",
    "battery_remaining",
    "heading",
    "system_status",
    "gps_fix",
    "errors_count",
];

/// Payload lines with this prefix carry connection metadata, not events
pub const METADATA_PREFIX: &str = "METADATA:";

/// Wall-clock stamp used on bridged envelopes (`HH:MM:SS`, UTC)
pub fn timestamp_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

/// Build a DRONE envelope from one telemetry datagram
///
/// Returns `None` if the datagram is not UTF-8 JSON, is not an object, or
/// has no string `packet_type`.
///
/// # Examples
///
/// ```
/// use operator_console::transport::bridge::telemetry_envelope;
///
/// let datagram = br#"{"packet_type":"SYS_STATUS","battery_remaining":87,"current_battery":240}"#;
/// let envelope = telemetry_envelope(datagram, "10:00:00").unwrap();
/// assert_eq!(envelope.message.as_deref(), Some("Position update: SYS_STATUS"));
/// assert!(envelope.data_object().unwrap().get("current_battery").is_none());
/// ```
pub fn telemetry_envelope(datagram: &[u8], timestamp: &str) -> Option<RawEnvelope> {
    let text = std::str::from_utf8(datagram).ok()?;
    let packet: Value = serde_json::from_str(text).ok()?;
    let packet = packet.as_object()?;
    let packet_type = packet.get("packet_type")?.as_str()?;

    let data: Map<String, Value> = TELEMETRY_FIELDS
        .iter()
        .filter_map(|field| {
            packet
                .get(*field)
                .filter(|value| !value.is_null())
                .map(|value| (field.to_string(), value.clone()))
        })
        .collect();

    Some(RawEnvelope {
        source: Some(DRONE_SOURCE.to_string()),
        message: Some(format!("Position update: {}", packet_type)),
        data: Some(Value::Object(data)),
        timestamp: timestamp.to_string(),
    })
}

/// Build a PAYLOAD envelope from one line of payload traffic
///
/// Returns `None` for blank lines and metadata lines.
pub fn payload_envelope(line: &str, sender: &str, timestamp: &str) -> Option<RawEnvelope> {
    let command = line.trim();
    if command.is_empty() || command.starts_with(METADATA_PREFIX) {
        return None;
    }

    Some(RawEnvelope {
        source: Some(PAYLOAD_SOURCE.to_string()),
        message: Some(format!("Command: {}", command)),
        data: Some(json!({
            "command": command,
            "sender": sender,
        })),
        timestamp: timestamp.to_string(),
    })
}

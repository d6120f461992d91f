//! # Event Envelope Types
//!
//! The top-level event object delivered by the transport layer, and the
//! subsystem event descriptor carried inside it.
//!
//! Both are read field-by-field from a `serde_json::Value` instead of being
//! derived, so a single wrongly-typed field never rejects a whole message.

use serde::Serialize;
use serde_json::{Map, Value};

/// Source tag of vehicle telemetry envelopes
pub const DRONE_SOURCE: &str = "DRONE";

/// Source tag the TCP bridge gives to payload events
pub const PAYLOAD_SOURCE: &str = "PAYLOAD";

/// Decoded top-level event object
///
/// Wire shape: `{source, message?, data?, timestamp}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    pub timestamp: String,
}

impl RawEnvelope {
    /// Build an envelope from a parsed JSON value
    ///
    /// Returns `None` if the value is not a JSON object. Fields of the wrong
    /// type and `null` fields are treated as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        Some(Self {
            source: string_field(object, "source"),
            message: string_field(object, "message"),
            data: object.get("data").filter(|v| !v.is_null()).cloned(),
            timestamp: string_field(object, "timestamp").unwrap_or_default(),
        })
    }

    /// True if the envelope carries vehicle telemetry
    #[must_use]
    pub fn is_drone(&self) -> bool {
        self.source.as_deref() == Some(DRONE_SOURCE)
    }

    /// The `data` payload as a JSON object, if it is one
    pub fn data_object(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref().and_then(Value::as_object)
    }
}

/// Subsystem event descriptor: `{event, subsystem, level, details, data}`
///
/// Every field may be absent; the default value is the empty descriptor used
/// when the nested command cannot be decoded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventDescriptor {
    pub event: Option<String>,
    pub subsystem: Option<String>,
    pub level: Option<String>,
    pub details: Option<String>,
    pub data: Map<String, Value>,
}

impl EventDescriptor {
    /// Build a descriptor from a parsed JSON value
    ///
    /// Non-object values produce the empty descriptor.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        Self {
            event: string_field(object, "event"),
            subsystem: string_field(object, "subsystem"),
            level: string_field(object, "level"),
            details: string_field(object, "details"),
            data: object
                .get("data")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// True if no field of the descriptor is populated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event.is_none()
            && self.subsystem.is_none()
            && self.level.is_none()
            && self.details.is_none()
            && self.data.is_empty()
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_from_full_object() {
        let value = json!({
            "source": "DRONE",
            "message": "Position update: GLOBAL_POSITION_INT",
            "data": {"alt": 121},
            "timestamp": "12:00:01"
        });

        let envelope = RawEnvelope::from_value(&value).unwrap();
        assert!(envelope.is_drone());
        assert_eq!(envelope.message.as_deref(), Some("Position update: GLOBAL_POSITION_INT"));
        assert_eq!(envelope.timestamp, "12:00:01");
        assert_eq!(envelope.data_object().unwrap()["alt"], json!(121));
    }

    #[test]
    fn test_envelope_missing_fields() {
        let envelope = RawEnvelope::from_value(&json!({})).unwrap();
        assert_eq!(envelope.source, None);
        assert_eq!(envelope.data, None);
        assert_eq!(envelope.timestamp, "");
        assert!(!envelope.is_drone());
    }

    #[test]
    fn test_envelope_wrong_types_are_absent() {
        let envelope = RawEnvelope::from_value(&json!({
            "source": 7,
            "data": null,
            "timestamp": false
        }))
        .unwrap();

        assert_eq!(envelope.source, None);
        assert_eq!(envelope.data, None);
        assert_eq!(envelope.timestamp, "");
    }

    #[test]
    fn test_envelope_rejects_non_object() {
        assert!(RawEnvelope::from_value(&json!([1, 2, 3])).is_none());
        assert!(RawEnvelope::from_value(&json!("DRONE")).is_none());
    }

    #[test]
    fn test_source_match_is_exact() {
        let envelope = RawEnvelope::from_value(&json!({"source": "drone"})).unwrap();
        assert!(!envelope.is_drone());
    }

    #[test]
    fn test_serialized_envelope_omits_absent_fields() {
        let envelope = RawEnvelope {
            source: Some(PAYLOAD_SOURCE.to_string()),
            timestamp: "08:15:00".to_string(),
            ..Default::default()
        };

        let text = serde_json::to_string(&envelope).unwrap();
        assert_eq!(text, r#"{"source":"PAYLOAD","timestamp":"08:15:00"}"#);
    }

    #[test]
    fn test_descriptor_from_object() {
        let descriptor = EventDescriptor::from_value(&json!({
            "event": "WEAK_GPS_SIGNAL",
            "subsystem": "GPS",
            "level": "WARN",
            "details": "GPS signal strength degraded.",
            "data": {"satellites": 6, "strength": "42%"}
        }));

        assert_eq!(descriptor.event.as_deref(), Some("WEAK_GPS_SIGNAL"));
        assert_eq!(descriptor.subsystem.as_deref(), Some("GPS"));
        assert_eq!(descriptor.level.as_deref(), Some("WARN"));
        assert_eq!(descriptor.data.len(), 2);
        assert!(!descriptor.is_empty());
    }

    #[test]
    fn test_descriptor_from_non_object_is_empty() {
        assert!(EventDescriptor::from_value(&json!(42)).is_empty());
        assert!(EventDescriptor::from_value(&json!(null)).is_empty());
    }

    #[test]
    fn test_descriptor_ignores_non_object_data() {
        let descriptor = EventDescriptor::from_value(&json!({"event": "PING", "data": "x"}));
        assert!(descriptor.data.is_empty());
        assert!(!descriptor.is_empty());
    }
}

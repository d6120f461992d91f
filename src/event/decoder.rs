//! # Message Decoder
//!
//! Two-stage decode of inbound payloads.
//!
//! Stage one parses the raw string into a [`RawEnvelope`]. A payload that is
//! itself a JSON string (double-encoded) is parsed once more. Stage two, for
//! non-telemetry sources only, decodes the JSON-encoded event descriptor held
//! under `data.command`.
//!
//! Failures are returned as values, never raised: an outer failure drops the
//! message, an inner failure degrades to the empty descriptor so the envelope
//! still counts for connection status.

use serde_json::Value;
use thiserror::Error;

use super::envelope::{EventDescriptor, RawEnvelope};

/// Key under `data` holding the nested, JSON-encoded event descriptor
pub const COMMAND_KEY: &str = "command";

/// Why a payload could not be fully decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    /// Outer payload is not a JSON envelope; the message is dropped
    #[error("malformed JSON payload: {reason}")]
    MalformedJson { reason: String, raw: String },

    /// Nested `data.command` is not a JSON object; the descriptor is empty
    #[error("malformed nested command: {reason}")]
    MalformedNestedCommand { reason: String, command: String },
}

impl DecodeFailure {
    /// Stable taxonomy code for diagnostics
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            DecodeFailure::MalformedJson { .. } => "MALFORMED_JSON",
            DecodeFailure::MalformedNestedCommand { .. } => "MALFORMED_NESTED_COMMAND",
        }
    }
}

/// A fully or partially decoded message
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub envelope: RawEnvelope,
    /// Empty for telemetry envelopes and for degraded decodes
    pub descriptor: EventDescriptor,
}

/// Tagged result of [`decode`]
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeResult {
    /// Envelope and (for non-telemetry sources) descriptor decoded
    Ok(DecodedEvent),
    /// Envelope decoded, nested command did not; descriptor is empty
    Degraded(DecodedEvent, DecodeFailure),
    /// Nothing usable
    Failed(DecodeFailure),
}

impl DecodeResult {
    /// The usable event, if any
    pub fn into_event(self) -> Option<DecodedEvent> {
        match self {
            DecodeResult::Ok(event) | DecodeResult::Degraded(event, _) => Some(event),
            DecodeResult::Failed(_) => None,
        }
    }

    /// The failure, if decoding was not clean
    pub fn failure(&self) -> Option<&DecodeFailure> {
        match self {
            DecodeResult::Ok(_) => None,
            DecodeResult::Degraded(_, failure) | DecodeResult::Failed(failure) => Some(failure),
        }
    }
}

/// Decode one raw payload
///
/// # Examples
///
/// ```
/// use operator_console::event::decoder::{decode, DecodeResult};
///
/// let result = decode(r#"{"source":"DRONE","data":{"alt":130},"timestamp":"10:00:00"}"#);
/// assert!(matches!(result, DecodeResult::Ok(_)));
///
/// let result = decode("{not json");
/// assert!(matches!(result, DecodeResult::Failed(_)));
/// ```
pub fn decode(raw: &str) -> DecodeResult {
    let envelope = match decode_envelope(raw) {
        Ok(envelope) => envelope,
        Err(failure) => return DecodeResult::Failed(failure),
    };

    if envelope.is_drone() {
        return DecodeResult::Ok(DecodedEvent {
            envelope,
            descriptor: EventDescriptor::default(),
        });
    }

    match decode_command(&envelope) {
        Ok(descriptor) => DecodeResult::Ok(DecodedEvent { envelope, descriptor }),
        Err(failure) => DecodeResult::Degraded(
            DecodedEvent {
                envelope,
                descriptor: EventDescriptor::default(),
            },
            failure,
        ),
    }
}

/// Stage one: parse the outer envelope
///
/// # Errors
///
/// Returns [`DecodeFailure::MalformedJson`] if the payload is not JSON or is
/// not a JSON object (after unwrapping one level of string encoding).
pub fn decode_envelope(raw: &str) -> Result<RawEnvelope, DecodeFailure> {
    let mut value: Value = serde_json::from_str(raw).map_err(|e| malformed_json(e, raw))?;

    if let Value::String(inner) = &value {
        value = serde_json::from_str(inner).map_err(|e| malformed_json(e, raw))?;
    }

    RawEnvelope::from_value(&value).ok_or_else(|| DecodeFailure::MalformedJson {
        reason: "payload is not a JSON object".to_string(),
        raw: raw.to_string(),
    })
}

/// Stage two: decode the event descriptor under `data.command`
///
/// An absent, `null` or blank command yields the empty descriptor. A command
/// that is already a JSON object is used as-is.
///
/// # Errors
///
/// Returns [`DecodeFailure::MalformedNestedCommand`] if the command string is
/// not JSON, or decodes to something other than an object.
pub fn decode_command(envelope: &RawEnvelope) -> Result<EventDescriptor, DecodeFailure> {
    let Some(command) = envelope.data_object().and_then(|data| data.get(COMMAND_KEY)) else {
        return Ok(EventDescriptor::default());
    };

    match command {
        Value::Null => Ok(EventDescriptor::default()),
        Value::String(text) if text.trim().is_empty() => Ok(EventDescriptor::default()),
        Value::String(text) => {
            let nested: Value = serde_json::from_str(text).map_err(|e| {
                DecodeFailure::MalformedNestedCommand {
                    reason: e.to_string(),
                    command: text.clone(),
                }
            })?;

            if !nested.is_object() {
                return Err(DecodeFailure::MalformedNestedCommand {
                    reason: "command is not a JSON object".to_string(),
                    command: text.clone(),
                });
            }

            Ok(EventDescriptor::from_value(&nested))
        }
        Value::Object(_) => Ok(EventDescriptor::from_value(command)),
        other => Err(DecodeFailure::MalformedNestedCommand {
            reason: "command is neither a string nor an object".to_string(),
            command: other.to_string(),
        }),
    }
}

fn malformed_json(error: serde_json::Error, raw: &str) -> DecodeFailure {
    DecodeFailure::MalformedJson {
        reason: error.to_string(),
        raw: raw.to_string(),
    }
}

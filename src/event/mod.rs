//! # Event Module
//!
//! Ingestion of inbound backend events.
//!
//! This module handles:
//! - Decoding raw payloads into envelopes (with double-encoding and nested command support)
//! - Classifying envelopes into telemetry updates or subsystem events
//! - Formatting subsystem events into log feed messages

pub mod classifier;
pub mod decoder;
pub mod envelope;
pub mod formatter;

pub use classifier::{classify, Classified};
pub use decoder::{decode, DecodeFailure, DecodeResult, DecodedEvent};
pub use envelope::{EventDescriptor, RawEnvelope, DRONE_SOURCE, PAYLOAD_SOURCE};
pub use formatter::{format_event, FormattedEvent};

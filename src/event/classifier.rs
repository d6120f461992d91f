//! # Event Classifier
//!
//! Routes a decoded event on its `source`: `DRONE` envelopes feed the
//! telemetry merger, everything else (including a missing source) is a
//! subsystem event for the formatter.

use super::decoder::DecodedEvent;
use super::envelope::EventDescriptor;
use crate::telemetry::TelemetryUpdate;

/// Where a decoded event goes next
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// Partial vehicle state for the telemetry merger
    Telemetry(TelemetryUpdate),
    /// Descriptor for the subsystem-event formatter (possibly empty)
    Subsystem(EventDescriptor),
}

/// Classify a decoded event
pub fn classify(event: DecodedEvent) -> Classified {
    if event.envelope.is_drone() {
        Classified::Telemetry(TelemetryUpdate::from_data(event.envelope.data_object()))
    } else {
        Classified::Subsystem(event.descriptor)
    }
}

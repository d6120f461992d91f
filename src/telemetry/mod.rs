//! # Telemetry Module
//!
//! Vehicle state normalization.
//!
//! This module handles:
//! - Reading partial updates from DRONE envelopes defensively
//! - Merging updates into the long-lived snapshot with per-field fallback
//! - Deriving ground speed from velocity components
//! - Tracking the map position separately from the snapshot
//! - Overlay presentation helpers (compass direction, battery bands)

pub mod display;
pub mod snapshot;

pub use snapshot::{merge, update_position, Position, TelemetrySnapshot, TelemetryUpdate, Velocity};

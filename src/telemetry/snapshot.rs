//! # Telemetry Snapshot and Merger
//!
//! The continuously-merged, best-known vehicle state and the pure reducer
//! that folds partial updates into it.
//!
//! Every snapshot field keeps its previous value unless the update carries a
//! value for it. Two values are special:
//!
//! - `speed` is derived from `vx`/`vy` (cm/s) and only recomputed when both
//!   are present in the same update.
//! - The map position is held outside the snapshot and only moves when both
//!   `lat` and `lon` are present and non-zero in the same update.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::TelemetryConfig;

/// Velocity components in cm/s
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
}

/// Current best-known vehicle state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    /// Altitude in meters
    pub altitude: f64,
    /// Ground speed in m/s, derived from velocity
    pub speed: f64,
    /// Battery remaining, nominally 0-100 %
    pub battery: f64,
    /// Heading in degrees
    pub heading: f64,
    /// Upper-cased system status (e.g. STANDBY, ACTIVE)
    pub status: String,
    pub gps_fix: bool,
    pub error_count: u32,
    pub velocity: Velocity,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self::from_config(&TelemetryConfig::default())
    }
}

impl TelemetrySnapshot {
    /// Initial snapshot shown before any telemetry arrives
    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self {
            altitude: config.altitude,
            speed: 0.0,
            battery: config.battery,
            heading: 0.0,
            status: config.status.to_uppercase(),
            gps_fix: config.gps_fix,
            error_count: 0,
            velocity: Velocity::default(),
        }
    }
}

/// Map position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self {
            lat: config.latitude,
            lon: config.longitude,
        }
    }
}

/// Partial telemetry update read from a DRONE envelope's `data`
///
/// `None` means "not supplied"; a wrongly-typed or `null` field counts as not
/// supplied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TelemetryUpdate {
    pub alt: Option<f64>,
    pub vx: Option<f64>,
    pub vy: Option<f64>,
    pub vz: Option<f64>,
    pub battery_remaining: Option<f64>,
    pub heading: Option<f64>,
    pub system_status: Option<String>,
    pub gps_fix: Option<bool>,
    pub errors_count: Option<u32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl TelemetryUpdate {
    /// Read an update from the envelope `data` object
    ///
    /// # Examples
    ///
    /// ```
    /// use operator_console::telemetry::TelemetryUpdate;
    /// use serde_json::json;
    ///
    /// let data = json!({"alt": 130, "system_status": "active", "gps_fix": "yes"});
    /// let update = TelemetryUpdate::from_data(data.as_object());
    /// assert_eq!(update.alt, Some(130.0));
    /// assert_eq!(update.system_status.as_deref(), Some("active"));
    /// assert_eq!(update.gps_fix, None);
    /// ```
    pub fn from_data(data: Option<&Map<String, Value>>) -> Self {
        let Some(data) = data else {
            return Self::default();
        };

        let number = |key: &str| data.get(key).and_then(Value::as_f64);

        Self {
            alt: number("alt"),
            vx: number("vx"),
            vy: number("vy"),
            vz: number("vz"),
            battery_remaining: number("battery_remaining"),
            heading: number("heading"),
            system_status: data
                .get("system_status")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            gps_fix: data.get("gps_fix").and_then(gps_fix_value),
            errors_count: data
                .get("errors_count")
                .and_then(Value::as_u64)
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
            lat: number("lat"),
            lon: number("lon"),
        }
    }

    /// Speed in m/s if both horizontal components are present
    #[must_use]
    pub fn derived_speed(&self) -> Option<f64> {
        match (self.vx, self.vy) {
            (Some(vx), Some(vy)) => Some(((vx / 100.0).powi(2) + (vy / 100.0).powi(2)).sqrt()),
            _ => None,
        }
    }

    /// New position if both coordinates are present and non-zero
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => Some(Position { lat, lon }),
            _ => None,
        }
    }
}

/// Accepts a JSON bool, or a MAVLink-style numeric fix type (non-zero = fix)
fn gps_fix_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(fix) => Some(*fix),
        Value::Number(n) => n.as_f64().map(|fix| fix != 0.0),
        _ => None,
    }
}

/// Fold a partial update into the snapshot
///
/// No clamping is applied; battery and heading are stored as received.
///
/// # Examples
///
/// ```
/// use operator_console::telemetry::{merge, TelemetrySnapshot, TelemetryUpdate};
///
/// let update = TelemetryUpdate { vx: Some(300.0), vy: Some(400.0), ..Default::default() };
/// let snapshot = merge(TelemetrySnapshot::default(), &update);
/// assert_eq!(snapshot.speed, 5.0);
/// ```
#[must_use]
pub fn merge(previous: TelemetrySnapshot, update: &TelemetryUpdate) -> TelemetrySnapshot {
    TelemetrySnapshot {
        altitude: update.alt.unwrap_or(previous.altitude),
        speed: update.derived_speed().unwrap_or(previous.speed),
        battery: update.battery_remaining.unwrap_or(previous.battery),
        heading: update.heading.unwrap_or(previous.heading),
        status: update
            .system_status
            .as_ref()
            .map(|s| s.to_uppercase())
            .unwrap_or(previous.status),
        gps_fix: update.gps_fix.unwrap_or(previous.gps_fix),
        error_count: update.errors_count.unwrap_or(previous.error_count),
        velocity: Velocity {
            vx: update.vx.unwrap_or(previous.velocity.vx),
            vy: update.vy.unwrap_or(previous.velocity.vy),
            vz: update.vz.unwrap_or(previous.velocity.vz),
        },
    }
}

/// Move the map position if the update carries a usable coordinate pair
#[must_use]
pub fn update_position(previous: Position, update: &TelemetryUpdate) -> Position {
    update.position().unwrap_or(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update_from(value: Value) -> TelemetryUpdate {
        TelemetryUpdate::from_data(value.as_object())
    }

    fn populated_snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot {
            altitude: 150.0,
            speed: 3.0,
            battery: 80.0,
            heading: 90.0,
            status: "ACTIVE".to_string(),
            gps_fix: true,
            error_count: 2,
            velocity: Velocity { vx: 300.0, vy: 0.0, vz: -10.0 },
        }
    }

    #[test]
    fn test_default_snapshot_matches_config_defaults() {
        let snapshot = TelemetrySnapshot::default();
        assert_eq!(snapshot.altitude, 120.0);
        assert_eq!(snapshot.battery, 95.0);
        assert_eq!(snapshot.status, "STANDBY");
        assert!(snapshot.gps_fix);
        assert_eq!(snapshot.speed, 0.0);
        assert_eq!(snapshot.error_count, 0);
    }

    #[test]
    fn test_empty_update_changes_nothing() {
        let previous = populated_snapshot();
        let merged = merge(previous.clone(), &TelemetryUpdate::default());
        assert_eq!(merged, previous);
    }

    #[test]
    fn test_each_field_falls_back_independently() {
        let previous = populated_snapshot();

        let merged = merge(previous.clone(), &update_from(json!({"alt": 175})));
        assert_eq!(merged.altitude, 175.0);
        assert_eq!(merged.battery, previous.battery);

        let merged = merge(previous.clone(), &update_from(json!({"battery_remaining": 42})));
        assert_eq!(merged.battery, 42.0);
        assert_eq!(merged.altitude, previous.altitude);

        let merged = merge(previous.clone(), &update_from(json!({"heading": 271.5})));
        assert_eq!(merged.heading, 271.5);
        assert_eq!(merged.status, previous.status);

        let merged = merge(previous.clone(), &update_from(json!({"gps_fix": false})));
        assert!(!merged.gps_fix);
        assert_eq!(merged.heading, previous.heading);

        let merged = merge(previous.clone(), &update_from(json!({"errors_count": 7})));
        assert_eq!(merged.error_count, 7);
        assert_eq!(merged.velocity, previous.velocity);

        let merged = merge(previous.clone(), &update_from(json!({"vz": 25})));
        assert_eq!(merged.velocity.vz, 25.0);
        assert_eq!(merged.velocity.vx, previous.velocity.vx);
        assert_eq!(merged.speed, previous.speed);
    }

    #[test]
    fn test_zero_values_are_applied() {
        // Presence, not truthiness, decides for snapshot fields
        let merged = merge(
            populated_snapshot(),
            &update_from(json!({"alt": 0, "battery_remaining": 0, "errors_count": 0})),
        );
        assert_eq!(merged.altitude, 0.0);
        assert_eq!(merged.battery, 0.0);
        assert_eq!(merged.error_count, 0);
    }

    #[test]
    fn test_speed_from_both_components() {
        let merged = merge(populated_snapshot(), &update_from(json!({"vx": 300, "vy": 400})));
        assert!((merged.speed - 5.0).abs() < f64::EPSILON);
        assert_eq!(merged.velocity.vx, 300.0);
        assert_eq!(merged.velocity.vy, 400.0);
    }

    #[test]
    fn test_speed_kept_with_single_component() {
        let previous = populated_snapshot();

        let merged = merge(previous.clone(), &update_from(json!({"vx": 1000})));
        assert_eq!(merged.speed, previous.speed);
        assert_eq!(merged.velocity.vx, 1000.0);

        let merged = merge(previous.clone(), &update_from(json!({"vy": 1000})));
        assert_eq!(merged.speed, previous.speed);
    }

    #[test]
    fn test_speed_can_drop_to_zero() {
        let merged = merge(populated_snapshot(), &update_from(json!({"vx": 0, "vy": 0})));
        assert_eq!(merged.speed, 0.0);
    }

    #[test]
    fn test_status_is_uppercased() {
        let merged = merge(populated_snapshot(), &update_from(json!({"system_status": "standby"})));
        assert_eq!(merged.status, "STANDBY");
    }

    #[test]
    fn test_empty_status_is_ignored() {
        let merged = merge(populated_snapshot(), &update_from(json!({"system_status": ""})));
        assert_eq!(merged.status, "ACTIVE");
    }

    #[test]
    fn test_no_clamping() {
        let merged = merge(
            populated_snapshot(),
            &update_from(json!({"battery_remaining": 130, "heading": -45})),
        );
        assert_eq!(merged.battery, 130.0);
        assert_eq!(merged.heading, -45.0);
    }

    #[test]
    fn test_wrong_types_are_absent() {
        let previous = populated_snapshot();
        let merged = merge(
            previous.clone(),
            &update_from(json!({
                "alt": "high",
                "battery_remaining": null,
                "system_status": 3,
                "errors_count": -1,
                "gps_fix": "yes"
            })),
        );
        assert_eq!(merged, previous);
    }

    #[test]
    fn test_numeric_gps_fix() {
        assert_eq!(update_from(json!({"gps_fix": 3})).gps_fix, Some(true));
        assert_eq!(update_from(json!({"gps_fix": 0})).gps_fix, Some(false));
    }

    #[test]
    fn test_missing_data_is_empty_update() {
        assert_eq!(TelemetryUpdate::from_data(None), TelemetryUpdate::default());
    }

    #[test]
    fn test_position_requires_both_coordinates() {
        let start = Position { lat: 47.6062, lon: -122.3321 };

        let moved = update_position(start, &update_from(json!({"lat": 47.61})));
        assert_eq!(moved, start);

        let moved = update_position(start, &update_from(json!({"lon": -122.33})));
        assert_eq!(moved, start);

        let moved = update_position(start, &update_from(json!({"lat": 47.61, "lon": -122.33})));
        assert_eq!(moved, Position { lat: 47.61, lon: -122.33 });
    }

    #[test]
    fn test_zero_coordinate_is_treated_as_absent() {
        let start = Position { lat: 47.6062, lon: -122.3321 };
        let moved = update_position(start, &update_from(json!({"lat": 0.0, "lon": -122.33})));
        assert_eq!(moved, start);
    }

    #[test]
    fn test_position_not_part_of_snapshot_merge() {
        let previous = populated_snapshot();
        let merged = merge(previous.clone(), &update_from(json!({"lat": 47.61, "lon": -122.33})));
        assert_eq!(merged, previous);
    }
}

//! Presentation helpers for the telemetry overlay.
//!
//! Clamping lives here, not in the merger: the snapshot keeps raw values.

/// 8-point compass labels, clockwise from north
const CARDINAL_DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Battery level bands used for gauge colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryBand {
    /// Above 50 %
    Good,
    /// Above 20 %
    Low,
    Critical,
}

impl BatteryBand {
    pub fn label(self) -> &'static str {
        match self {
            BatteryBand::Good => "GOOD",
            BatteryBand::Low => "LOW",
            BatteryBand::Critical => "CRITICAL",
        }
    }
}

/// Nearest 8-point compass direction for a heading in degrees
///
/// # Examples
///
/// ```
/// use operator_console::telemetry::display::cardinal_direction;
///
/// assert_eq!(cardinal_direction(0.0), "N");
/// assert_eq!(cardinal_direction(100.0), "E");
/// assert_eq!(cardinal_direction(-90.0), "W");
/// ```
#[must_use]
pub fn cardinal_direction(heading: f64) -> &'static str {
    if !heading.is_finite() {
        return CARDINAL_DIRECTIONS[0];
    }
    let index = (heading / 45.0).round().rem_euclid(8.0) as usize;
    CARDINAL_DIRECTIONS[index % 8]
}

#[must_use]
pub fn battery_band(battery: f64) -> BatteryBand {
    if battery > 50.0 {
        BatteryBand::Good
    } else if battery > 20.0 {
        BatteryBand::Low
    } else {
        BatteryBand::Critical
    }
}

/// Battery percentage clamped for gauge width
#[must_use]
pub fn battery_gauge_percent(battery: f64) -> f64 {
    battery.clamp(0.0, 100.0)
}

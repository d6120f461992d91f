//! Connection-status latch.
//!
//! Starts `Disconnected`, flips to `Connected` on the first classified
//! envelope and never reverts within a session. When no transport could be
//! brought up at all the latch is also set, flagged as degraded, so the
//! operator view is never stuck waiting.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionStatus {
    /// Status banner text
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Awaiting Connection",
            ConnectionStatus::Connected => "Mission Control Active",
        }
    }
}

/// One-way connection latch
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    status: ConnectionStatus,
    degraded: bool,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a classified envelope; returns true on the transition
    pub fn mark_connected(&mut self) -> bool {
        let transitioned = self.status == ConnectionStatus::Disconnected;
        self.status = ConnectionStatus::Connected;
        transitioned
    }

    /// Record that no event source is available; returns true on the transition
    pub fn mark_transport_unavailable(&mut self) -> bool {
        self.degraded = true;
        self.mark_connected()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// True if the latch was set by the transport-absent fallback
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disconnected() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.status(), ConnectionStatus::Disconnected);
        assert!(!tracker.is_connected());
        assert!(!tracker.is_degraded());
    }

    #[test]
    fn test_transitions_exactly_once() {
        let mut tracker = ConnectionTracker::new();
        assert!(tracker.mark_connected());
        assert!(!tracker.mark_connected());
        assert!(!tracker.mark_connected());
        assert_eq!(tracker.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn test_transport_unavailable_connects_degraded() {
        let mut tracker = ConnectionTracker::new();
        assert!(tracker.mark_transport_unavailable());
        assert!(tracker.is_connected());
        assert!(tracker.is_degraded());

        // Later real traffic does not re-announce
        assert!(!tracker.mark_connected());
    }

    #[test]
    fn test_labels() {
        assert_eq!(ConnectionStatus::Disconnected.label(), "Awaiting Connection");
        assert_eq!(ConnectionStatus::Connected.label(), "Mission Control Active");
    }
}

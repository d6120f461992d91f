//! # Log Entry Types
//!
//! One operator-visible notification in the log feed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Unique log entry identifier
///
/// Random (UUID v4), so entries created within the same millisecond never
/// collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LogId(Uuid);

impl LogId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LogId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Log entry severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Info,
    Warn,
    Critical,
}

impl Severity {
    /// Parse an upstream `level` value
    ///
    /// Accepts `INFO`, `WARN` and `CRITICAL`, ignoring case and surrounding
    /// whitespace. Anything else is `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use operator_console::log_queue::Severity;
    ///
    /// assert_eq!(Severity::parse("WARN"), Some(Severity::Warn));
    /// assert_eq!(Severity::parse(" critical "), Some(Severity::Critical));
    /// assert_eq!(Severity::parse("DEBUG"), None);
    /// ```
    pub fn parse(level: &str) -> Option<Self> {
        match level.trim().to_ascii_uppercase().as_str() {
            "INFO" => Some(Severity::Info),
            "WARN" => Some(Severity::Warn),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Toast icon
    pub fn icon(self) -> &'static str {
        match self {
            Severity::Info => "ℹ️",
            Severity::Warn => "⚠️",
            Severity::Critical => "🚨",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification in the log feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: LogId,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// Create an entry stamped with the current time and a fresh id
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: LogId::new(),
            message: message.into(),
            severity,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique_in_a_burst() {
        let ids: HashSet<LogId> = (0..10_000).map(|_| LogId::new()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_entries_created_together_have_distinct_ids() {
        let a = LogEntry::new("a", Severity::Info);
        let b = LogEntry::new("a", Severity::Info);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("INFO"), Some(Severity::Info));
        assert_eq!(Severity::parse("warn"), Some(Severity::Warn));
        assert_eq!(Severity::parse("CRITICAL"), Some(Severity::Critical));
        assert_eq!(Severity::parse("ERROR"), None);
        assert_eq!(Severity::parse(""), None);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warn.to_string(), "WARN");
        assert_eq!(Severity::default(), Severity::Info);
    }

    #[test]
    fn test_severity_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"CRITICAL\"");
    }
}

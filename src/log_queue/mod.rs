//! # Log Queue Module
//!
//! The transient log feed shown to the operator.
//!
//! This module handles:
//! - Log entry identity (collision-free ids) and severity
//! - A fixed-capacity, insertion-ordered queue with oldest-first eviction
//! - Per-entry expiry timers reported over a channel
//! - Operator dismissal that cancels the pending timer

pub mod entry;
pub mod queue;

pub use entry::{LogEntry, LogId, Severity};
pub use queue::LogQueue;

//! # Operator Console Library
//!
//! Ingests drone telemetry and payload subsystem events, keeps a live
//! telemetry snapshot, and maintains a bounded, self-expiring operator log.
//!
//! Inbound `(topic, payload)` pairs flow through:
//! decode ([`event::decode`]) → classify ([`event::classify`]) → either the
//! telemetry merger ([`telemetry::merge`]) or the subsystem formatter
//! ([`event::format_event`]) feeding the [`log_queue::LogQueue`].
//! The [`console::Console`] task owns all of that state.

pub mod config;
pub mod console;
pub mod error;
pub mod event;
pub mod log_queue;
pub mod telemetry;
pub mod transport;

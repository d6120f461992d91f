//! # Error Types
//!
//! Custom error types for the operator console using `thiserror`.

use thiserror::Error;

/// Main error type for the operator console
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No event source could be brought up
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// The console task is gone
    #[error("Console channel closed")]
    ChannelClosed,

    /// The console is not keeping up; the message was dropped
    #[error("Console channel full, dropped event on topic '{0}'")]
    ChannelFull(String),
}

/// Result type alias for the operator console
pub type Result<T> = std::result::Result<T, ConsoleError>;

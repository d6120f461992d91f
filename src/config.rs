//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every field is optional; a missing config file is
//! equivalent to an empty one.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{ConsoleError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub log_queue: LogQueueConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// UDP/TCP bridge configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_udp_port")]
    pub udp_port: u16,

    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,

    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,

    #[serde(default = "default_ack")]
    pub ack: bool,
}

/// Coordinating task configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleConfig {
    #[serde(default = "default_topic")]
    pub topic: String,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Log feed configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LogQueueConfig {
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

/// Initial vehicle state shown before the first telemetry packet
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_altitude")]
    pub altitude: f64,

    #[serde(default = "default_battery")]
    pub battery: f64,

    #[serde(default = "default_status")]
    pub status: String,

    #[serde(default = "default_gps_fix")]
    pub gps_fix: bool,

    #[serde(default = "default_latitude")]
    pub latitude: f64,

    #[serde(default = "default_longitude")]
    pub longitude: f64,
}

/// Diagnostics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub file_enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Default value functions
fn default_bind_address() -> String { "0.0.0.0".to_string() }
fn default_udp_port() -> u16 { 14550 }
fn default_tcp_port() -> u16 { 9001 }
fn default_max_datagram_size() -> usize { 1024 }
fn default_ack() -> bool { true }

fn default_topic() -> String { "new-backend-event".to_string() }
fn default_channel_capacity() -> usize { 256 }

fn default_queue_capacity() -> usize { 5 }
fn default_ttl_ms() -> u64 { 8000 }

fn default_altitude() -> f64 { 120.0 }
fn default_battery() -> f64 { 95.0 }
fn default_status() -> String { "STANDBY".to_string() }
fn default_gps_fix() -> bool { true }
fn default_latitude() -> f64 { 47.6062 }
fn default_longitude() -> f64 { -122.3321 }

fn default_log_level() -> String { "info".to_string() }
fn default_log_dir() -> String { "./logs".to_string() }

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            udp_port: default_udp_port(),
            tcp_port: default_tcp_port(),
            max_datagram_size: default_max_datagram_size(),
            ack: default_ack(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for LogQueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            ttl_ms: default_ttl_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            altitude: default_altitude(),
            battery: default_battery(),
            status: default_status(),
            gps_fix: default_gps_fix(),
            latitude: default_latitude(),
            longitude: default_longitude(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_enabled: false,
            log_dir: default_log_dir(),
        }
    }
}

/// Accepted `logging.level` values
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn invalid(message: impl std::fmt::Display) -> ConsoleError {
    ConsoleError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use operator_console::config::Config;
    ///
    /// let config = Config::load("config/console.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.transport.bind_address.trim().is_empty() {
            return Err(invalid("bind_address cannot be empty"));
        }

        if self.transport.udp_port == 0 || self.transport.tcp_port == 0 {
            return Err(invalid("udp_port and tcp_port must be non-zero"));
        }

        if self.transport.udp_port == self.transport.tcp_port {
            return Err(invalid("udp_port and tcp_port must differ"));
        }

        // 65507 is the largest UDP payload over IPv4
        if self.transport.max_datagram_size < 64 || self.transport.max_datagram_size > 65507 {
            return Err(invalid("max_datagram_size must be between 64 and 65507"));
        }

        if self.console.topic.is_empty() {
            return Err(invalid("topic cannot be empty"));
        }

        if self.console.channel_capacity == 0 || self.console.channel_capacity > 65536 {
            return Err(invalid("channel_capacity must be between 1 and 65536"));
        }

        if self.log_queue.capacity == 0 || self.log_queue.capacity > 64 {
            return Err(invalid("log_queue capacity must be between 1 and 64"));
        }

        if self.log_queue.ttl_ms < 100 || self.log_queue.ttl_ms > 600_000 {
            return Err(invalid("ttl_ms must be between 100 and 600000"));
        }

        if !(0.0..=100.0).contains(&self.telemetry.battery) {
            return Err(invalid("battery must be between 0 and 100"));
        }

        if !(-90.0..=90.0).contains(&self.telemetry.latitude) {
            return Err(invalid("latitude must be between -90 and 90"));
        }

        if !(-180.0..=180.0).contains(&self.telemetry.longitude) {
            return Err(invalid("longitude must be between -180 and 180"));
        }

        if self.logging.file_enabled && self.logging.log_dir.is_empty() {
            return Err(invalid("log_dir cannot be empty when file logging is enabled"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

//! # Operator Console
//!
//! Mission control console for a drone and its payload computer.
//!
//! Listens for telemetry datagrams and payload event lines, keeps the live
//! telemetry snapshot, and maintains the self-expiring operator log feed.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use operator_console::config::{Config, LoggingConfig};
use operator_console::console::{command_channel, Console, ConsoleView};
use operator_console::transport::Transport;

/// Seconds between status overlay log lines
const STATUS_INTERVAL_SECS: u64 = 5;

/// File name prefix for rolling log files
const LOG_FILE_PREFIX: &str = "operator-console.log";

#[derive(Debug, Parser)]
#[command(name = "operator-console", version, about = "Drone operator console")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

/// Main entry point for the operator console
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (defaults when no file is given)
///    - Set up logging with tracing subscriber
///    - Start the console task and the status reporter
///    - Bind the UDP telemetry and TCP payload listeners
///
/// 2. **Main Loop**
///    - Console applies events, dismissals and expiry timers in order
///    - Status overlay is logged every few seconds
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop listeners
///    - Stop the console, cancelling all pending log timers
///    - Log pipeline counters
///
/// # Errors
///
/// Returns error if the configuration file cannot be read or is invalid.
/// Failing to bind the listeners is not fatal: the console keeps running in
/// degraded mode.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(level) = args.log_level {
        config.logging.level = level;
        config.validate().context("Invalid --log-level")?;
    }

    let _log_guard = init_logging(&config.logging);

    info!("Operator Console v{} starting...", env!("CARGO_PKG_VERSION"));
    match &args.config {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No configuration file given, using defaults"),
    }

    let console = Console::new(&config);
    let view_rx = console.subscribe();
    let (handle, commands) = command_channel(config.console.channel_capacity);
    let console_task = tokio::spawn(console.run(commands));
    let reporter_task = tokio::spawn(report_status(view_rx));

    let mut transport = match Transport::start(&config.transport, &config.console.topic, Arc::new(handle.clone())).await {
        Ok(transport) => Some(transport),
        Err(e) => {
            warn!("{}", e);
            handle.transport_unavailable(e.to_string()).await?;
            None
        }
    };

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;
    info!("Shutting down...");

    if let Some(transport) = transport.as_mut() {
        transport.shutdown();
    }
    handle.shutdown().await?;
    let stats = console_task.await.context("Console task failed")?;
    reporter_task.abort();

    info!(
        "Operator Console stopped after {} envelopes ({} malformed)",
        stats.envelopes, stats.decode_failures
    );

    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// must be held until exit so buffered file output is flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = if config.file_enabled {
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Periodically log the status overlay and the visible log feed
async fn report_status(mut view_rx: watch::Receiver<ConsoleView>) {
    let mut ticker = interval(Duration::from_secs(STATUS_INTERVAL_SECS));

    loop {
        ticker.tick().await;

        let view = view_rx.borrow_and_update().clone();
        info!("{}", view.summary());
        for line in view.log_lines() {
            debug!("  {}", line);
        }
        if let Ok(json) = serde_json::to_string(&view) {
            debug!("View: {}", json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_interval_constant() {
        // Slow enough not to flood the log at telemetry rates
        assert_eq!(STATUS_INTERVAL_SECS, 5);
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["operator-console"]);
        assert!(args.config.is_none());
        assert!(args.log_level.is_none());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from(["operator-console", "--config", "console.toml", "--log-level", "debug"]);
        assert_eq!(args.config, Some(PathBuf::from("console.toml")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }
}

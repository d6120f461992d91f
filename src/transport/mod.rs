//! Transport layer
//!
//! Bridges upstream telemetry (UDP) and payload (TCP) traffic into backend
//! event envelopes and hands them to an [`EventSink`], normally the console
//! command channel.

pub mod bridge;
pub mod tcp;
pub mod udp;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::TransportConfig;
use crate::error::{ConsoleError, Result};

/// Destination for bridged `(topic, payload)` events
///
/// Implementations must not block; a sink that cannot keep up drops the
/// event and returns an error.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    fn emit(&self, topic: &str, payload: String) -> Result<()>;
}

/// Running UDP and TCP listener tasks
///
/// Listener tasks are aborted when the transport is dropped.
#[derive(Debug)]
pub struct Transport {
    tasks: Vec<JoinHandle<()>>,
    udp_addr: Option<SocketAddr>,
    tcp_addr: Option<SocketAddr>,
}

impl Transport {
    /// Bind both listeners and start forwarding into `sink`
    ///
    /// A listener that fails to bind is logged and skipped, so the console
    /// still runs on whichever source is available.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::TransportUnavailable`] if neither listener
    /// could be bound.
    pub async fn start(config: &TransportConfig, topic: &str, sink: Arc<dyn EventSink>) -> Result<Self> {
        // Dropping a partially built transport aborts whatever was spawned
        let mut transport = Self {
            tasks: Vec::new(),
            udp_addr: None,
            tcp_addr: None,
        };
        let mut failures = Vec::new();

        let udp_bind = format!("{}:{}", config.bind_address, config.udp_port);
        match UdpSocket::bind(&udp_bind).await {
            Ok(socket) => {
                transport.udp_addr = Some(socket.local_addr()?);
                transport.tasks.push(tokio::spawn(udp::run_udp_listener(
                    socket,
                    config.max_datagram_size,
                    topic.to_string(),
                    Arc::clone(&sink),
                )));
            }
            Err(e) => {
                warn!("Failed to bind telemetry UDP socket {}: {}", udp_bind, e);
                failures.push(format!("udp {}: {}", udp_bind, e));
            }
        }

        let tcp_bind = format!("{}:{}", config.bind_address, config.tcp_port);
        match TcpListener::bind(&tcp_bind).await {
            Ok(listener) => {
                transport.tcp_addr = Some(listener.local_addr()?);
                transport.tasks.push(tokio::spawn(tcp::run_tcp_listener(
                    listener,
                    topic.to_string(),
                    config.ack,
                    Arc::clone(&sink),
                )));
            }
            Err(e) => {
                warn!("Failed to bind payload TCP listener {}: {}", tcp_bind, e);
                failures.push(format!("tcp {}: {}", tcp_bind, e));
            }
        }

        if transport.tasks.is_empty() {
            return Err(ConsoleError::TransportUnavailable(failures.join("; ")));
        }

        info!(
            "Transport started (udp: {:?}, tcp: {:?})",
            transport.udp_addr, transport.tcp_addr
        );

        Ok(transport)
    }

    /// Bound telemetry address, if the UDP listener is running
    pub fn udp_addr(&self) -> Option<SocketAddr> {
        self.udp_addr
    }

    /// Bound payload address, if the TCP listener is running
    pub fn tcp_addr(&self) -> Option<SocketAddr> {
        self.tcp_addr
    }

    /// Stop all listener tasks and every open payload connection
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! UDP telemetry listener.

use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use super::bridge::{telemetry_envelope, timestamp_now};
use super::EventSink;

/// Receive telemetry datagrams until the task is aborted
pub async fn run_udp_listener(
    socket: UdpSocket,
    max_datagram_size: usize,
    topic: String,
    sink: Arc<dyn EventSink>,
) {
    if let Ok(addr) = socket.local_addr() {
        info!("Telemetry UDP listener started on {}", addr);
    }

    let mut buf = vec![0u8; max_datagram_size];

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, addr)) => {
                debug!("Received {} byte datagram from {}", len, addr);
                forward_datagram(&buf[..len], &topic, sink.as_ref());
            }
            Err(e) => {
                warn!("UDP receive error: {}", e);
            }
        }
    }
}

/// Bridge one datagram into the sink
///
/// Returns true if an event was emitted.
pub fn forward_datagram(datagram: &[u8], topic: &str, sink: &dyn EventSink) -> bool {
    let Some(envelope) = telemetry_envelope(datagram, &timestamp_now()) else {
        debug!("Dropping datagram that is not a telemetry packet");
        return false;
    };

    let payload = match serde_json::to_string(&envelope) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Failed to encode telemetry envelope: {}", e);
            return false;
        }
    };

    match sink.emit(topic, payload) {
        Ok(()) => true,
        Err(e) => {
            debug!("Telemetry event not delivered: {}", e);
            false
        }
    }
}

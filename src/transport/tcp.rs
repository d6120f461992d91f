//! TCP payload event listener.
//!
//! Each accepted connection is served by its own task. Incoming bytes are
//! buffered and split on newlines, so an event spanning several reads is
//! reassembled; a trailing line without a newline is flushed when the peer
//! closes.

use bytes::BytesMut;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::bridge::{payload_envelope, timestamp_now};
use super::EventSink;

/// Acknowledgement written after each read
pub const ACK: &[u8] = b"ACK\n";

/// Initial per-connection read buffer size
const READ_BUFFER_SIZE: usize = 1024;

/// Longest line kept while waiting for its newline
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Accept payload connections until the task is aborted
///
/// Connection tasks belong to this task: aborting the listener aborts every
/// open connection with it.
pub async fn run_tcp_listener(listener: TcpListener, topic: String, ack: bool, sink: Arc<dyn EventSink>) {
    if let Ok(addr) = listener.local_addr() {
        info!("Payload TCP listener started on {}", addr);
    }

    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!("New payload connection from {}", addr);
                    let sink = Arc::clone(&sink);
                    let topic = topic.clone();

                    connections.spawn(async move {
                        match handle_connection(stream, &addr.to_string(), &topic, ack, sink.as_ref()).await {
                            Ok(count) => debug!("Connection {} closed after {} events", addr, count),
                            Err(e) => debug!("Connection {} ended with error: {}", addr, e),
                        }
                    });
                }
                Err(e) => {
                    warn!("TCP accept error: {}", e);
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }
}

/// Newline splitter over a growing read buffer
///
/// A line that outgrows [`MAX_LINE_LENGTH`] is dropped whole: what has been
/// buffered is discarded and the rest is skipped up to its newline.
#[derive(Debug)]
struct LineBuffer {
    buffer: BytesMut,
    discarding: bool,
}

impl LineBuffer {
    fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            discarding: false,
        }
    }

    /// Next complete line, without its newline
    fn next_line(&mut self) -> Option<BytesMut> {
        loop {
            let newline = self.buffer.iter().position(|&b| b == b'\n')?;
            let mut line = self.buffer.split_to(newline + 1);
            line.truncate(newline);

            if self.discarding {
                self.discarding = false;
                continue;
            }
            return Some(line);
        }
    }

    /// Drop the pending partial line if it is too long; returns bytes dropped
    fn enforce_limit(&mut self) -> usize {
        if self.buffer.len() <= MAX_LINE_LENGTH {
            return 0;
        }
        let dropped = self.buffer.len();
        self.buffer.clear();
        self.discarding = true;
        dropped
    }

    /// Unterminated trailing line, if any
    fn take_remainder(&mut self) -> Option<BytesMut> {
        if self.discarding || self.buffer.is_empty() {
            return None;
        }
        Some(self.buffer.split())
    }
}

/// Serve one payload connection until EOF
///
/// Returns the number of events emitted. A trailing line without a newline
/// is emitted when the connection ends, including when it ends in an error.
///
/// # Errors
///
/// Returns the underlying I/O error if reading or acknowledging fails.
pub async fn handle_connection<S>(
    mut stream: S,
    sender: &str,
    topic: &str,
    ack: bool,
    sink: &dyn EventSink,
) -> io::Result<usize>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut lines = LineBuffer::new();
    let mut emitted = 0;

    let result = loop {
        match stream.read_buf(&mut lines.buffer).await {
            Ok(0) => break Ok(()),
            Ok(_) => {}
            Err(e) => break Err(e),
        }

        while let Some(line) = lines.next_line() {
            emitted += emit_line(&line, sender, topic, sink);
        }

        let dropped = lines.enforce_limit();
        if dropped > 0 {
            warn!("Discarding {} bytes from {} without a line break", dropped, sender);
        }

        if ack {
            if let Err(e) = stream.write_all(ACK).await {
                break Err(e);
            }
        }
    };

    if let Some(remainder) = lines.take_remainder() {
        emitted += emit_line(&remainder, sender, topic, sink);
    }

    result.map(|()| emitted)
}

fn emit_line(bytes: &[u8], sender: &str, topic: &str, sink: &dyn EventSink) -> usize {
    let line = match std::str::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => {
            warn!("Dropping non UTF-8 payload line from {}: {}", sender, e);
            return 0;
        }
    };

    let Some(envelope) = payload_envelope(line, sender, &timestamp_now()) else {
        return 0;
    };

    let payload = match serde_json::to_string(&envelope) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Failed to encode payload envelope: {}", e);
            return 0;
        }
    };

    match sink.emit(topic, payload) {
        Ok(()) => 1,
        Err(e) => {
            debug!("Payload event not delivered: {}", e);
            0
        }
    }
}

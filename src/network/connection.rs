//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::protocol::{write_value, Decoder, Value};

/// Handles a single client connection
pub struct Connection {
    /// Request decoder over the buffered read half
    decoder: Decoder<BufReader<TcpStream>>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the engine
    engine: Arc<Engine>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            decoder: Decoder::new(BufReader::new(read_stream)),
            writer: BufWriter::new(write_stream),
            engine,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves a direction unbounded)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.decoder
                .get_ref()
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and sends replies.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let request = match self.decoder.decode() {
                Ok(Some(value)) => value,
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("Connection with {} dropped: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(KvError::Io(ref e))
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    // Read timeout (Windows uses TimedOut instead of WouldBlock)
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(KvError::Protocol { offset, message }) => {
                    tracing::warn!(
                        "Protocol error from {} at byte {}: {}",
                        self.peer_addr,
                        offset,
                        message
                    );
                    // The stream is no longer at a value boundary; reply and hang up
                    let reply = Value::error(format!(
                        "ERR Protocol error: {} at byte {}",
                        message, offset
                    ));
                    let _ = self.send_reply(&reply);
                    return Err(KvError::Protocol { offset, message });
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!("Received request from {}: {:?}", self.peer_addr, request);

            let reply = self.engine.execute(&request);

            if let Err(e) = self.send_reply(&reply) {
                if e.is_disconnect() {
                    tracing::debug!(
                        "Client {} disconnected before reply could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }

            if self.engine.shutdown_requested() {
                tracing::debug!("Closing {} after SHUTDOWN", self.peer_addr);
                return Ok(());
            }
        }
    }

    /// Send a reply to the client
    fn send_reply(&mut self, reply: &Value) -> Result<()> {
        write_value(&mut self.writer, reply)
    }
}

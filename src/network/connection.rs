//! Connection Handler
//!
//! One short-lived duplex byte channel per logical exchange.

use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Config;
use crate::error::{HostlinkError, Result};

/// A duplex byte channel over the wire format
///
/// The executor acquires exactly one connection per attempt and releases it
/// afterward. A connection that failed mid-exchange is closed before release
/// so the pool discards it instead of reusing a possibly-corrupt channel.
pub trait Connection: Send {
    /// Readable side of the channel
    fn reader(&mut self) -> &mut dyn Read;

    /// Writable side of the channel
    fn writer(&mut self) -> &mut dyn Write;

    /// Mark the channel unusable; the pool must not hand it out again
    fn close(&mut self);

    /// Whether the channel has been closed
    fn is_closed(&self) -> bool;
}

impl std::fmt::Debug for dyn Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("is_closed", &self.is_closed())
            .finish()
    }
}

/// TCP connection to the server
pub struct TcpConnection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: String,

    /// Set once the exchange failed partway; blocks pool reuse
    closed: bool,
}

impl TcpConnection {
    /// Open a new connection per the config
    ///
    /// Resolves the server address, connects with the configured timeout,
    /// disables Nagle's algorithm, and applies read/write timeouts.
    pub fn connect(config: &Config) -> Result<Self> {
        let addr = config
            .server_addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                HostlinkError::Config(format!(
                    "Server address resolved to nothing: {}",
                    config.server_addr
                ))
            })?;

        let stream = if config.connect_timeout_ms > 0 {
            TcpStream::connect_timeout(&addr, Duration::from_millis(config.connect_timeout_ms))?
        } else {
            TcpStream::connect(addr)?
        };

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            peer_addr,
            closed: false,
        })
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Connection for TcpConnection {
    fn reader(&mut self) -> &mut dyn Read {
        &mut self.reader
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.writer
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            // Best-effort shutdown; the socket drops with the struct anyway
            let _ = self.writer.get_ref().shutdown(std::net::Shutdown::Both);
            tracing::debug!("Closed connection to {}", self.peer_addr);
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

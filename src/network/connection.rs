//! Connection Handler
//!
//! Serves exactly one request on one accepted connection.

use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{DirKvError, Result};
use crate::protocol::{discard_line, read_request, write_response, Command, Response};

/// How long to wait for the tail of an oversized request
const DRAIN_TIMEOUT: Duration = Duration::from_millis(50);

/// Most bytes dropped from an oversized request before giving up
const DRAIN_LIMIT: usize = 64 * 1024;

/// Where a connection is in its single request/response exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitRequest,
    Parsed,
    Dispatched,
    ResponseSent,
    Closed,
}

/// Handles a single client connection
///
/// ```text
/// AwaitRequest ─► Parsed ─► Dispatched ─► ResponseSent ─► Closed
///       │            └──(rejected)──────────►┘               ▲
///       └──(empty / disconnect / timeout)────────────────────┘
/// ```
///
/// A request that overflows the buffer is rejected like a malformed one,
/// after the rest of it is read off the socket.
pub struct Connection {
    /// TCP stream, unbuffered: each response line is its own write
    stream: TcpStream,

    /// Reference to the command executor
    engine: Arc<Engine>,

    /// Request buffer size and response frame cap
    max_message_len: usize,

    /// Current protocol state
    state: State,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm; responses are tiny
        stream.set_nodelay(true)?;

        let max_message_len = engine.config().max_message_len;

        Ok(Self {
            stream,
            engine,
            max_message_len,
            state: State::AwaitRequest,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 = none)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.stream
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.stream
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Serve the one request and close
    ///
    /// Peer disconnects and timeouts end the connection quietly; other
    /// I/O failures are returned after the stream is closed.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let result = self.exchange();
        self.close();
        result
    }

    fn exchange(&mut self) -> Result<()> {
        let parsed = match read_request(&mut self.stream, self.max_message_len) {
            Ok(Some(line)) => {
                tracing::trace!("Received {} bytes from {}", line.len(), self.peer_addr);
                Command::parse(&line, self.engine.max_value_len())
            }
            Ok(None) => {
                tracing::debug!("Empty message from {}", self.peer_addr);
                return Ok(());
            }
            Err(DirKvError::Parse(e)) => {
                let dropped = self.discard_overflow();
                tracing::debug!(
                    "Request from {} overflowed the buffer ({} more bytes dropped)",
                    self.peer_addr,
                    dropped
                );
                Err(e)
            }
            Err(e) if e.is_disconnect() || e.is_timeout() => {
                tracing::debug!("No request from {}: {}", self.peer_addr, e);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                return Err(e);
            }
        };
        self.transition(State::Parsed);

        let response = match parsed {
            Ok(command) => {
                tracing::debug!(
                    "{} {} from {}",
                    command.command_type().as_str(),
                    command.key(),
                    self.peer_addr
                );
                self.transition(State::Dispatched);
                self.engine.execute(command)
            }
            Err(e) => {
                tracing::debug!("Rejected request from {}: {}", self.peer_addr, e);
                Response::from_parse_error(&e)
            }
        };

        match write_response(&mut self.stream, &response, self.max_message_len) {
            Ok(written) => {
                tracing::trace!("Sent {} bytes to {}", written, self.peer_addr);
                self.transition(State::ResponseSent);
                Ok(())
            }
            Err(e) if e.is_disconnect() => {
                tracing::debug!(
                    "Client {} disconnected before response could be sent: {}",
                    self.peer_addr,
                    e
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                Err(e)
            }
        }
    }

    /// Read off what is left of an oversized request; unread input would
    /// turn the close into a reset
    fn discard_overflow(&mut self) -> usize {
        let _ = self.stream.set_read_timeout(Some(DRAIN_TIMEOUT));
        discard_line(&mut self.stream, DRAIN_LIMIT)
    }

    fn close(&mut self) {
        // The peer may already be gone; nothing to report either way
        let _ = self.stream.shutdown(Shutdown::Both);
        self.transition(State::Closed);
    }

    fn transition(&mut self, next: State) {
        tracing::trace!("{}: {:?} -> {:?}", self.peer_addr, self.state, next);
        self.state = next;
    }

    /// Get the current protocol state
    pub fn state(&self) -> State {
        self.state
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

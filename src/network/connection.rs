//! Connection Handler
//!
//! Handles individual client connections.
//!
//! ## State Machine
//! ```text
//! Idle ─start()─▶ AwaitingRequest ─frame─▶ Dispatching ─encode─▶ AwaitingWriteComplete
//!                       ▲                                               │
//!                       └──────────── Persistent mode only ◀────────────┤
//!                                                                       ▼
//!                                                                    Closed
//! ```
//! A transport error or malformed frame in any state goes straight to
//! `Closed` without a response.

use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

use bytes::BytesMut;

use super::registry::{ConnectionId, ConnectionRegistry, ConnectionTicket};
use crate::config::{ServerConfig, SessionMode};
use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::protocol::{decode_request, encode_response_into, read_frame, Request};

/// Initial capacity of the inbound and outbound buffers
const BUFFER_CAPACITY: usize = 4 * 1024;

/// Lifecycle states of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    AwaitingRequest,
    Dispatching,
    AwaitingWriteComplete,
    Closed,
}

/// Handles a single client connection
///
/// The connection owns its socket and both buffers. [`Connection::start`]
/// consumes it, so nothing can free them while a read or write is running.
pub struct Connection {
    /// Client socket
    stream: TcpStream,

    /// Bytes of the frame being read
    inbound: BytesMut,

    /// Encoded response being written
    outbound: BytesMut,

    /// Shared store, outlives every connection
    dictionary: Arc<Dictionary>,

    /// Requests served before closing
    mode: SessionMode,

    state: ConnectionState,

    /// Registration handle; dropping it deregisters the connection
    ticket: ConnectionTicket,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Configures the socket from `config` and registers the connection.
    pub fn new(
        stream: TcpStream,
        dictionary: Arc<Dictionary>,
        registry: &Arc<ConnectionRegistry>,
        config: &ServerConfig,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;

        let ticket = registry.register(peer_addr.clone());

        Ok(Self {
            stream,
            inbound: BytesMut::with_capacity(BUFFER_CAPACITY),
            outbound: BytesMut::with_capacity(BUFFER_CAPACITY),
            dictionary,
            mode: config.session_mode,
            state: ConnectionState::Idle,
            ticket,
            peer_addr,
        })
    }

    /// Run the connection until it closes (blocking)
    ///
    /// Peer disconnects and timeouts end the session quietly. Malformed
    /// frames and other transport failures are returned after the socket
    /// is closed.
    pub fn start(mut self) -> Result<()> {
        tracing::debug!(conn = self.id(), "Connection established from {}", self.peer_addr);

        let result = self.serve();
        self.transition(ConnectionState::Closed);
        let _ = self.stream.shutdown(Shutdown::Both);

        match result {
            Ok(()) => {
                tracing::debug!(conn = self.id(), "Connection to {} closed", self.peer_addr);
                Ok(())
            }
            Err(e) if e.is_disconnect() => {
                tracing::debug!(conn = self.id(), "Client {} disconnected: {}", self.peer_addr, e);
                Ok(())
            }
            Err(e) if e.is_timeout() => {
                tracing::debug!(conn = self.id(), "Timed out waiting on client {}", self.peer_addr);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn serve(&mut self) -> Result<()> {
        loop {
            self.transition(ConnectionState::AwaitingRequest);
            let request = match self.read_request()? {
                Some(request) => request,
                None => {
                    tracing::debug!(conn = self.id(), "Client {} closed the stream", self.peer_addr);
                    return Ok(());
                }
            };

            self.transition(ConnectionState::Dispatching);
            tracing::info!(conn = self.id(), peer = %self.peer_addr, "Request: {}", request);
            let response = self.dictionary.execute(request);

            self.outbound.clear();
            encode_response_into(&response, &mut self.outbound)?;

            self.transition(ConnectionState::AwaitingWriteComplete);
            tracing::info!(conn = self.id(), peer = %self.peer_addr, "Response: {}", response);
            self.stream.write_all(&self.outbound)?;
            self.stream.flush()?;
            tracing::trace!(conn = self.id(), "Wrote {} bytes", self.outbound.len());

            if self.mode == SessionMode::SingleShot {
                return Ok(());
            }
        }
    }

    fn read_request(&mut self) -> Result<Option<Request>> {
        if !read_frame(&mut self.stream, &mut self.inbound)? {
            return Ok(None);
        }
        decode_request(&self.inbound).map(Some)
    }

    fn transition(&mut self, next: ConnectionState) {
        tracing::trace!(conn = self.id(), "{:?} -> {:?}", self.state, next);
        self.state = next;
        self.ticket.set_state(next);
    }

    /// Registry id of this connection
    pub fn id(&self) -> ConnectionId {
        self.ticket.id()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

//! Transport abstraction layer for the auction feed.
//!
//! The codec works on whole messages. A transport's only job is to carry
//! them: [`Connection::send`] takes one framed message, and
//! [`Connection::recv`] yields one. Chunking and reassembly, if the
//! underlying stream needs any, stay inside the implementation.
//!
//! Implementations:
//!
//! - [`WebSocketTransport`] / [`WebSocketConnection`]: one binary
//!   WebSocket frame per message (feature `websocket`, on by default).
//! - [`MemoryTransport`] / [`MemoryConnection`]: in-process channels,
//!   for tests and for embedding a server and client in one process.

mod error;
mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::{MemoryConnection, MemoryConnector, MemoryTransport};
#[cfg(feature = "websocket")]
pub use websocket::{ClientWebSocket, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs across all transports.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_connection_id() -> ConnectionId {
    ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;

    /// Stops accepting new connections.
    fn shutdown(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// A single connection that carries whole messages.
///
/// All methods take `&self` so one task can wait in `recv` while another
/// sends (heartbeats). Implementations must not hold a shared lock across
/// both directions.
pub trait Connection: Send + Sync + 'static {
    /// Sends one message to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

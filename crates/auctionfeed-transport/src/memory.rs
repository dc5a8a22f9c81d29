//! In-process transport built on tokio channels.
//!
//! Each direction of a [`MemoryConnection`] is its own unbounded channel,
//! so sending never waits on the peer and one message in is exactly one
//! message out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, Notify};

use crate::{next_connection_id, Connection, ConnectionId, Transport, TransportError};

/// One end of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    /// `None` once this end has been closed.
    tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl MemoryConnection {
    /// Creates two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, a_rx), Self::new(b_tx, b_rx))
    }

    fn new(
        tx: mpsc::UnboundedSender<Vec<u8>>,
        rx: mpsc::UnboundedReceiver<Vec<u8>>,
    ) -> Self {
        Self {
            id: next_connection_id(),
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(rx),
        }
    }
}

impl Connection for MemoryConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let tx = self.tx.lock().await;
        let Some(tx) = tx.as_ref() else {
            return Err(TransportError::ConnectionClosed(
                "closed locally".into(),
            ));
        };
        tx.send(data.to_vec()).map_err(|_| {
            TransportError::ConnectionClosed("peer dropped".into())
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.rx.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        // Dropping the sender lets the peer drain what was sent and then
        // see a clean close.
        self.tx.lock().await.take();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Server side of an in-memory listener.
pub struct MemoryTransport {
    incoming: mpsc::UnboundedReceiver<MemoryConnection>,
    closed: Arc<AtomicBool>,
    shutdown: Notify,
}

/// Client side of an in-memory listener. Cheap to clone.
#[derive(Clone)]
pub struct MemoryConnector {
    tx: mpsc::UnboundedSender<MemoryConnection>,
    closed: Arc<AtomicBool>,
}

impl MemoryTransport {
    /// Creates a listener and the connector that dials it.
    pub fn new() -> (Self, MemoryConnector) {
        let (tx, incoming) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            incoming,
            closed: Arc::clone(&closed),
            shutdown: Notify::new(),
        };
        (transport, MemoryConnector { tx, closed })
    }
}

impl MemoryConnector {
    /// Opens a connection; the other end is handed to `accept`.
    pub fn connect(&self) -> Result<MemoryConnection, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Shutdown);
        }
        let (client, server) = MemoryConnection::pair();
        self.tx.send(server).map_err(|_| TransportError::Shutdown)?;
        Ok(client)
    }
}

impl Transport for MemoryTransport {
    type Connection = MemoryConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Shutdown);
        }
        tokio::select! {
            conn = self.incoming.recv() => conn.ok_or(TransportError::Shutdown),
            _ = self.shutdown.notified() => Err(TransportError::Shutdown),
        }
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        self.shutdown.notify_one();
        Ok(())
    }
}

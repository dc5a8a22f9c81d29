//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! One binary frame carries one message. The socket is split into sink
//! and stream halves, each behind its own lock, so a pending `recv` never
//! blocks a heartbeat `send`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Notify};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{next_connection_id, Connection, ConnectionId, Transport, TransportError};

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
    closed: AtomicBool,
    shutdown: Notify,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self {
            listener,
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        })
    }

    /// The address the listener is bound to (useful after binding port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    async fn handshake(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> Result<WebSocketConnection, TransportError> {
        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;
        let conn = WebSocketConnection::from_stream(ws);
        tracing::debug!(id = %conn.id, %addr, "accepted WebSocket connection");
        Ok(conn)
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;

    async fn accept(&mut self) -> Result<Self::Connection, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Shutdown);
        }
        let (stream, addr) = tokio::select! {
            accepted = self.listener.accept() => {
                accepted.map_err(TransportError::AcceptFailed)?
            }
            _ = self.shutdown.notified() => return Err(TransportError::Shutdown),
        };
        self.handshake(stream, addr).await
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        self.shutdown.notify_one();
        tracing::info!("WebSocket transport shut down");
        Ok(())
    }
}

/// A WebSocket connection dialed by a client.
pub type ClientWebSocket = WebSocketConnection<MaybeTlsStream<TcpStream>>;

/// A single WebSocket connection, server- or client-side.
pub struct WebSocketConnection<S = TcpStream> {
    id: ConnectionId,
    sink: Mutex<SplitSink<WebSocketStream<S>, Message>>,
    stream: Mutex<SplitStream<WebSocketStream<S>>>,
}

impl<S> WebSocketConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn from_stream(ws: WebSocketStream<S>) -> Self {
        let (sink, stream) = ws.split();
        Self {
            id: next_connection_id(),
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }
}

impl WebSocketConnection<MaybeTlsStream<TcpStream>> {
    /// Dials a feed server, e.g. `ws://127.0.0.1:8080`.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (ws, _) = tokio_tungstenite::connect_async(url).await.map_err(|e| {
            TransportError::ConnectFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;
        let conn = Self::from_stream(ws);
        tracing::debug!(id = %conn.id, url, "connected WebSocket");
        Ok(conn)
    }
}

impl<S> Connection for WebSocketConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let msg = Message::Binary(data.to_vec().into());
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

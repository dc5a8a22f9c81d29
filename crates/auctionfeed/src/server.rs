//! `FeedServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session handler.

use std::sync::Arc;

use auctionfeed_transport::{Transport, TransportError, WebSocketTransport};

use crate::auth::Authenticator;
use crate::config::FeedConfig;
use crate::handler::handle_connection;
use crate::source::AuctionSource;
use crate::FeedError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<A, S> {
    pub(crate) config: FeedConfig,
    pub(crate) auth: A,
    pub(crate) source: S,
}

/// Builder for a WebSocket [`FeedServer`].
///
/// # Example
///
/// ```rust,ignore
/// use auctionfeed::prelude::*;
///
/// let server = FeedServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(my_auth, AuctionBook::new())
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone, Default)]
pub struct FeedServerBuilder {
    config: FeedConfig,
}

impl FeedServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the whole configuration, bind address included.
    pub fn config(mut self, config: FeedConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the WebSocket listener.
    pub async fn build<A, S>(
        self,
        auth: A,
        source: S,
    ) -> Result<FeedServer<WebSocketTransport, A, S>, FeedError>
    where
        A: Authenticator,
        S: AuctionSource,
    {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        Ok(FeedServer::with_transport(transport, self.config, auth, source))
    }
}

/// A feed server over some [`Transport`].
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct FeedServer<T, A, S> {
    transport: T,
    state: Arc<ServerState<A, S>>,
}

impl<T, A, S> FeedServer<T, A, S>
where
    T: Transport,
    A: Authenticator,
    S: AuctionSource,
{
    /// Serves over an already-listening transport. `config.bind_addr` is
    /// not used.
    pub fn with_transport(transport: T, config: FeedConfig, auth: A, source: S) -> Self {
        Self {
            transport,
            state: Arc::new(ServerState {
                config,
                auth,
                source,
            }),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.state.config
    }

    /// Runs the accept loop, one handler task per connection.
    ///
    /// Returns once the transport reports [`TransportError::Shutdown`].
    /// Other accept errors are logged and the loop continues.
    pub async fn run(mut self) -> Result<(), FeedError> {
        tracing::info!("feed server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(TransportError::Shutdown) => {
                    tracing::info!("feed server stopped");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}

impl<A, S> FeedServer<WebSocketTransport, A, S> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }
}

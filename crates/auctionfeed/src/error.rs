//! Unified error type for the feed client and server.

use auctionfeed_protocol::{PacketKind, ProtocolError};
use auctionfeed_transport::TransportError;

/// Top-level error that wraps the layer errors below the feed.
///
/// The `#[from]` conversions let `?` lift codec and transport failures
/// without call-site mapping.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A transport-level error (bind, connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The server refused the client's Identify.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// A bounded wait ran out.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// The peer sent a valid packet at the wrong point in the session.
    #[error("unexpected {0} packet")]
    UnexpectedPacket(PacketKind),

    /// The peer closed the connection mid-exchange.
    #[error("connection closed by peer")]
    ConnectionClosed,
}

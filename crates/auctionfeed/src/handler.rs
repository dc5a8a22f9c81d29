//! Per-connection handler: identify, session, and request routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Identify (bounded by `identify_timeout`) → authenticate
//!   2. Send Metadata, then SessionCreate
//!   3. Loop: Heartbeat keeps the session alive, RequestAuctions gets an
//!      Auctions page; silence longer than `idle_timeout` ends it

use std::sync::Arc;

use auctionfeed_protocol::{
    Auctions, Identify, IncomingPacket, Metadata, OutgoingPacket, SessionCreate,
    INCOMING, OUTGOING,
};
use auctionfeed_transport::Connection;
use rand::Rng;

use crate::auth::Authenticator;
use crate::server::ServerState;
use crate::source::AuctionSource;
use crate::FeedError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C, A, S>(
    conn: C,
    state: Arc<ServerState<A, S>>,
) -> Result<(), FeedError>
where
    C: Connection,
    A: Authenticator,
    S: AuctionSource,
{
    let result = serve(&conn, &state).await;
    let _ = conn.close().await;
    result
}

async fn serve<C, A, S>(conn: &C, state: &ServerState<A, S>) -> Result<(), FeedError>
where
    C: Connection,
    A: Authenticator,
    S: AuctionSource,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Identify ---
    let identify = receive_identify(conn, state).await?;
    if let Err(e) = state.auth.authenticate(&identify).await {
        tracing::info!(%conn_id, username = %identify.username, error = %e, "identify rejected");
        return Err(e);
    }

    // --- Step 2: Session ---
    let session = SessionCreate {
        session_id: generate_session_id(),
        seq: 0,
    };
    send(
        conn,
        Metadata {
            heartbeat_interval: state.config.heartbeat_interval_ms(),
        },
    )
    .await?;
    send(conn, session.clone()).await?;
    tracing::info!(
        %conn_id,
        username = %identify.username,
        session_id = %session.session_id,
        "session created"
    );

    // --- Step 3: Message loop ---
    let idle_timeout = state.config.idle_timeout();
    loop {
        let data = match tokio::time::timeout(idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, "no heartbeat, dropping client");
                break;
            }
        };

        let packet = match OUTGOING.decode(&data) {
            Ok(decoded) => decoded.packet,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode message");
                continue;
            }
        };

        match packet {
            OutgoingPacket::Heartbeat(_) => {
                tracing::trace!(%conn_id, "heartbeat");
            }
            OutgoingPacket::RequestAuctions(request) => {
                let auctions = state
                    .source
                    .query(&request, state.config.max_page_size)
                    .await;
                tracing::trace!(
                    %conn_id,
                    query = %request.query,
                    order = %request.order,
                    count = auctions.len(),
                    "serving auctions"
                );
                send(conn, Auctions { auctions }).await?;
            }
            OutgoingPacket::Identify(_) => {
                tracing::debug!(%conn_id, "ignoring repeated Identify");
            }
        }
    }

    Ok(())
}

/// Waits for the first message and requires it to be Identify.
async fn receive_identify<C, A, S>(
    conn: &C,
    state: &ServerState<A, S>,
) -> Result<Identify, FeedError>
where
    C: Connection,
{
    let data = match tokio::time::timeout(state.config.identify_timeout, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => return Err(FeedError::ConnectionClosed),
        Ok(Err(e)) => return Err(FeedError::Transport(e)),
        Err(_) => return Err(FeedError::Timeout("Identify")),
    };

    let decoded = OUTGOING.decode(&data)?;
    match decoded.packet {
        OutgoingPacket::Identify(identify) => Ok(identify),
        _ => Err(FeedError::UnexpectedPacket(decoded.kind)),
    }
}

async fn send<C: Connection>(
    conn: &C,
    packet: impl Into<IncomingPacket>,
) -> Result<(), FeedError> {
    let frame = INCOMING.encode_packet(&packet.into())?;
    conn.send(&frame).await?;
    Ok(())
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_session_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_32_hex_chars() {
        let id = generate_session_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, generate_session_id());
    }
}

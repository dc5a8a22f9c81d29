//! Client side of the feed: identify, keep the session alive, page
//! through auctions.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use auctionfeed_protocol::{
    Auction, Heartbeat, Identify, IncomingPacket, OutgoingPacket, PacketKind,
    PacketSet, RequestAuctions, SessionCreate, INCOMING, OUTGOING,
};
use auctionfeed_transport::Connection;
use tokio::task::JoinHandle;

use crate::FeedError;

/// How long [`FeedClient::connect`] waits for Metadata and SessionCreate.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// An identified session with a feed server.
pub struct FeedClient<C: Connection> {
    conn: Arc<C>,
    session: SessionCreate,
    /// Milliseconds, as last announced by Metadata.
    heartbeat_ms: Arc<AtomicI32>,
}

impl<C: Connection> FeedClient<C> {
    /// Sends Identify and waits for the session, bounded by
    /// [`HANDSHAKE_TIMEOUT`].
    pub async fn connect(conn: C, identify: Identify) -> Result<Self, FeedError> {
        Self::connect_timeout(conn, identify, HANDSHAKE_TIMEOUT).await
    }

    /// Like [`connect`](Self::connect) with an explicit handshake bound.
    ///
    /// Metadata and SessionCreate may arrive in either order. Anything
    /// else before both have arrived is [`FeedError::UnexpectedPacket`].
    pub async fn connect_timeout(
        conn: C,
        identify: Identify,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let conn_id = conn.id();
        let frame = OUTGOING.encode_packet(&OutgoingPacket::Identify(identify))?;
        conn.send(&frame).await?;

        let handshake = async {
            let mut heartbeat_ms = None;
            let mut session = None;
            loop {
                match recv_packet(&conn).await? {
                    IncomingPacket::Metadata(m) => heartbeat_ms = Some(m.heartbeat_interval),
                    IncomingPacket::SessionCreate(s) => session = Some(s),
                    IncomingPacket::Auctions(_) => {
                        return Err(FeedError::UnexpectedPacket(PacketKind::Auctions));
                    }
                }
                if let (Some(ms), Some(s)) = (heartbeat_ms, session.as_ref()) {
                    return Ok::<_, FeedError>((ms, s.clone()));
                }
            }
        };

        let (heartbeat_ms, session) = match tokio::time::timeout(timeout, handshake).await {
            Ok(result) => result?,
            Err(_) => return Err(FeedError::Timeout("session")),
        };
        tracing::debug!(%conn_id, session_id = %session.session_id, heartbeat_ms, "session created");

        Ok(Self {
            conn: Arc::new(conn),
            session,
            heartbeat_ms: Arc::new(AtomicI32::new(heartbeat_ms)),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session.session_id
    }

    pub fn seq(&self) -> i16 {
        self.session.seq
    }

    /// The current heartbeat interval. Zero when the server announced a
    /// non-positive one.
    pub fn heartbeat_interval(&self) -> Duration {
        interval_from_ms(self.heartbeat_ms.load(Ordering::Relaxed))
    }

    pub async fn send_heartbeat(&self) -> Result<(), FeedError> {
        send(&*self.conn, Heartbeat).await
    }

    /// Sends Heartbeat every interval until a send fails or the interval
    /// drops to zero. Picks up interval changes from later Metadata.
    pub fn spawn_heartbeat(&self) -> JoinHandle<Result<(), FeedError>> {
        let conn = Arc::clone(&self.conn);
        let heartbeat_ms = Arc::clone(&self.heartbeat_ms);
        tokio::spawn(async move {
            loop {
                let interval = interval_from_ms(heartbeat_ms.load(Ordering::Relaxed));
                if interval.is_zero() {
                    return Ok(());
                }
                tokio::time::sleep(interval).await;
                if let Err(e) = send(&*conn, Heartbeat).await {
                    tracing::debug!(error = %e, "heartbeat failed");
                    return Err(e);
                }
            }
        })
    }

    /// Sends `request` and returns the next Auctions page.
    pub async fn request_auctions(
        &self,
        request: RequestAuctions,
    ) -> Result<Vec<Auction>, FeedError> {
        send(&*self.conn, request).await?;
        loop {
            match self.next_packet().await? {
                IncomingPacket::Auctions(page) => return Ok(page.auctions),
                IncomingPacket::Metadata(_) => continue,
                other => return Err(FeedError::UnexpectedPacket(other.kind())),
            }
        }
    }

    /// Receives and decodes the next packet. Metadata also updates the
    /// stored heartbeat interval.
    pub async fn next_packet(&self) -> Result<IncomingPacket, FeedError> {
        let packet = recv_packet(&*self.conn).await?;
        if let IncomingPacket::Metadata(m) = &packet {
            self.heartbeat_ms.store(m.heartbeat_interval, Ordering::Relaxed);
            tracing::debug!(heartbeat_ms = m.heartbeat_interval, "heartbeat interval updated");
        }
        Ok(packet)
    }

    pub async fn close(&self) -> Result<(), FeedError> {
        self.conn.close().await?;
        Ok(())
    }
}

async fn recv_packet<C: Connection>(conn: &C) -> Result<IncomingPacket, FeedError> {
    let data = conn.recv().await?.ok_or(FeedError::ConnectionClosed)?;
    Ok(INCOMING.decode(&data)?.packet)
}

async fn send<C: Connection>(
    conn: &C,
    packet: impl Into<OutgoingPacket>,
) -> Result<(), FeedError> {
    let frame = OUTGOING.encode_packet(&packet.into())?;
    conn.send(&frame).await?;
    Ok(())
}

fn interval_from_ms(ms: i32) -> Duration {
    u64::try_from(ms).map_or(Duration::ZERO, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_interval_disables_heartbeat() {
        assert_eq!(interval_from_ms(0), Duration::ZERO);
        assert_eq!(interval_from_ms(-5), Duration::ZERO);
        assert_eq!(interval_from_ms(1_500), Duration::from_millis(1_500));
    }
}

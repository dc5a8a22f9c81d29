//! # auctionfeed
//!
//! Client and server for the auction feed, built on the binary wire
//! protocol in [`auctionfeed_protocol`] and the message transports in
//! [`auctionfeed_transport`].
//!
//! A session looks like this:
//!
//! ```text
//! client                         server
//!   Identify            ───────▶   authenticate
//!                       ◀───────   Metadata { heartbeat_interval }
//!                       ◀───────   SessionCreate { session_id, seq }
//!   Heartbeat (every interval) ─▶
//!   RequestAuctions     ───────▶   AuctionSource::query
//!                       ◀───────   Auctions
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use auctionfeed::prelude::*;
//!
//! struct AnyKey;
//!
//! impl Authenticator for AnyKey {
//!     async fn authenticate(&self, _identify: &Identify) -> Result<(), FeedError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> Result<(), FeedError> {
//! let server = FeedServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(AnyKey, AuctionBook::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod auth;
mod client;
mod config;
mod error;
mod handler;
mod server;
mod source;

pub use auth::Authenticator;
pub use client::{FeedClient, HANDSHAKE_TIMEOUT};
pub use config::FeedConfig;
pub use error::FeedError;
pub use server::{FeedServer, FeedServerBuilder};
pub use source::{AuctionBook, AuctionSource};

pub mod prelude {
    pub use crate::{
        AuctionBook, AuctionSource, Authenticator, FeedClient, FeedConfig,
        FeedError, FeedServer, FeedServerBuilder,
    };
    pub use auctionfeed_protocol::{
        Auction, Auctions, Bid, Category, Filter, Identify, IncomingPacket,
        ItemDisplay, OutgoingPacket, Rarity, RequestAuctions, SortOrder,
        Timestamps,
    };
    pub use auctionfeed_transport::{
        ClientWebSocket, Connection, MemoryConnection, MemoryTransport,
        Transport, WebSocketConnection, WebSocketTransport,
    };
}

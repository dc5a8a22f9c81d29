//! Wire protocol for the auction feed.
//!
//! This crate is the byte-exact part of the system:
//!
//! - **Buffers** ([`ByteBuf`], [`DeferredBuf`], [`WireWrite`]): varints,
//!   length-prefixed strings, big-endian fixed-width values, booleans
//!   and arrays.
//! - **Packets** ([`Packet`] and the six variants): one ID and one fixed
//!   field sequence each.
//! - **Registries** ([`OUTGOING`], [`INCOMING`]): map a leading varint ID
//!   to a variant, independently per direction.
//! - **Errors** ([`ProtocolError`]): everything that can go wrong with a
//!   single message.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about sockets or sessions. It turns
//! whole messages into typed values and back:
//!
//! ```text
//! Transport (bytes) → Protocol (OutgoingPacket / IncomingPacket) → Feed (session)
//! ```
//!
//! # Example
//!
//! ```rust
//! use auctionfeed_protocol::{
//!     OutgoingPacket, PacketKind, RequestAuctions, SortOrder, OUTGOING,
//! };
//!
//! let request = OutgoingPacket::RequestAuctions(RequestAuctions {
//!     filters: vec![],
//!     query: "sword".into(),
//!     order: SortOrder::LowPrice,
//!     start: 0,
//!     amount: 20,
//! });
//!
//! let frame = OUTGOING.encode(4, &request).unwrap();
//! let decoded = OUTGOING.decode(&frame).unwrap();
//! assert_eq!(decoded.kind, PacketKind::RequestAuctions);
//! assert_eq!(decoded.packet, request);
//! ```

mod buffer;
mod codes;
mod error;
mod packets;
mod registry;

pub use buffer::{
    string_prefix, varint_len, ByteBuf, DeferredBuf, WireWrite,
    MAX_SAFE_INTEGER, MAX_VARINT_LEN,
};
pub use codes::{Category, Rarity, SortOrder};
pub use error::ProtocolError;
pub use packets::{
    Auction, Auctions, Bid, Filter, Heartbeat, Identify, ItemDisplay,
    Metadata, Packet, RequestAuctions, SessionCreate, Timestamps,
};
pub use registry::{
    Decoded, Direction, IncomingPacket, OutgoingPacket, PacketKind,
    PacketSet, Registry, INCOMING, OUTGOING,
};

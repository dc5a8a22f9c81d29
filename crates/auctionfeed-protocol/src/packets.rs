//! Packet variants and the records they carry.
//!
//! Every variant is a plain struct with a fixed, ordered field list. The
//! order fields are written in *is* the wire format, so `write_body` and
//! `read_body` of each variant must stay mirror images of each other.
//!
//! ```text
//! frame := varint(id) field field ...
//! ```
//!
//! Reading builds each record only after all of its fields decoded, so a
//! truncated or malformed message never yields a half-filled value.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::buffer::{ByteBuf, DeferredBuf, WireWrite};
use crate::codes::{Category, Rarity, SortOrder};
use crate::registry::PacketKind;
use crate::ProtocolError;

/// A single packet variant: one ID, one payload shape.
pub trait Packet: Sized {
    /// Which variant this is. Fixes the ID and direction.
    const KIND: PacketKind;

    /// The direction-local packet ID.
    const ID: u64 = Self::KIND.id();

    /// Writes the payload fields, without the ID.
    fn write_body(&self, buf: &mut impl WireWrite) -> Result<(), ProtocolError>;

    /// Reads the payload fields. The ID has already been consumed.
    fn read_body(buf: &mut ByteBuf) -> Result<Self, ProtocolError>;

    /// Produces the complete frame: ID followed by payload.
    fn encode(&self) -> Result<Bytes, ProtocolError> {
        let mut buf = DeferredBuf::new();
        buf.write_varint(Self::ID)?;
        self.write_body(&mut buf)?;
        Ok(buf.finish())
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// First message a client sends: who it is and the key it uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identify {
    pub username: String,
    pub uuid: String,
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

impl Packet for Identify {
    const KIND: PacketKind = PacketKind::Identify;

    fn write_body(&self, buf: &mut impl WireWrite) -> Result<(), ProtocolError> {
        // Deployed clients put the username first.
        buf.write_string(&self.username)?;
        buf.write_string(&self.uuid)?;
        buf.write_string(&self.api_key)
    }

    fn read_body(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        let username = buf.read_string()?;
        let uuid = buf.read_string()?;
        let api_key = buf.read_string()?;
        Ok(Self {
            username,
            uuid,
            api_key,
        })
    }
}

/// Liveness signal. The frame is the ID alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat;

impl Packet for Heartbeat {
    const KIND: PacketKind = PacketKind::Heartbeat;

    fn write_body(&self, _buf: &mut impl WireWrite) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn read_body(_buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        Ok(Self)
    }
}

/// One `{type, value}` search filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Filter {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    fn write_to(&self, buf: &mut impl WireWrite) -> Result<(), ProtocolError> {
        buf.write_string(&self.kind)?;
        buf.write_string(&self.value)
    }

    fn read_from(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        let kind = buf.read_string()?;
        let value = buf.read_string()?;
        Ok(Self { kind, value })
    }
}

/// Asks for one page of auctions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAuctions {
    pub filters: Vec<Filter>,
    pub query: String,
    pub order: SortOrder,
    /// Offset of the first auction on the page.
    pub start: i16,
    /// Page size.
    pub amount: i16,
}

impl Packet for RequestAuctions {
    const KIND: PacketKind = PacketKind::RequestAuctions;

    fn write_body(&self, buf: &mut impl WireWrite) -> Result<(), ProtocolError> {
        buf.write_array(&self.filters, |buf, f| f.write_to(buf))?;
        buf.write_string(&self.query)?;
        self.order.write(buf);
        buf.write_short(self.start);
        buf.write_short(self.amount);
        Ok(())
    }

    fn read_body(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        let filters = buf.read_array(Filter::read_from)?;
        let query = buf.read_string()?;
        let order = SortOrder::read(buf)?;
        let start = buf.read_short()?;
        let amount = buf.read_short()?;
        Ok(Self {
            filters,
            query,
            order,
            start,
            amount,
        })
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Tells the client how often to send [`Heartbeat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Milliseconds between heartbeats.
    pub heartbeat_interval: i32,
}

impl Packet for Metadata {
    const KIND: PacketKind = PacketKind::Metadata;

    fn write_body(&self, buf: &mut impl WireWrite) -> Result<(), ProtocolError> {
        buf.write_int(self.heartbeat_interval);
        Ok(())
    }

    fn read_body(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        let heartbeat_interval = buf.read_int()?;
        Ok(Self { heartbeat_interval })
    }
}

/// Confirms the session after a successful [`Identify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCreate {
    pub session_id: String,
    pub seq: i16,
}

impl Packet for SessionCreate {
    const KIND: PacketKind = PacketKind::SessionCreate;

    fn write_body(&self, buf: &mut impl WireWrite) -> Result<(), ProtocolError> {
        buf.write_string(&self.session_id)?;
        buf.write_short(self.seq);
        Ok(())
    }

    fn read_body(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        let session_id = buf.read_string()?;
        let seq = buf.read_short()?;
        Ok(Self { session_id, seq })
    }
}

/// Display data for the auctioned item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDisplay {
    pub name: String,
    pub lore: Vec<String>,
    pub category: Category,
    pub rarity: Rarity,
}

impl ItemDisplay {
    fn write_to(&self, buf: &mut impl WireWrite) -> Result<(), ProtocolError> {
        buf.write_string(&self.name)?;
        buf.write_string_array(&self.lore)?;
        self.category.write(buf);
        self.rarity.write(buf);
        Ok(())
    }

    fn read_from(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        let name = buf.read_string()?;
        let lore = buf.read_string_array()?;
        let category = Category::read(buf)?;
        let rarity = Rarity::read(buf)?;
        Ok(Self {
            name,
            lore,
            category,
            rarity,
        })
    }
}

/// Auction start and end, epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub start: i64,
    pub end: i64,
}

/// A single bid on an auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub bidder: String,
    pub bidder_profile: String,
    pub amount: i64,
    pub timestamp: i64,
}

impl Bid {
    fn write_to(&self, buf: &mut impl WireWrite) -> Result<(), ProtocolError> {
        buf.write_string(&self.bidder)?;
        buf.write_string(&self.bidder_profile)?;
        buf.write_long(self.amount);
        buf.write_long(self.timestamp);
        Ok(())
    }

    fn read_from(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        let bidder = buf.read_string()?;
        let bidder_profile = buf.read_string()?;
        let amount = buf.read_long()?;
        let timestamp = buf.read_long()?;
        Ok(Self {
            bidder,
            bidder_profile,
            amount,
            timestamp,
        })
    }
}

/// One auction listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub auction_id: String,
    pub seller: String,
    pub seller_profile: String,
    /// Opaque serialized item, passed through untouched.
    #[serde(rename = "itemBytes")]
    pub item_bytes: String,
    pub item: ItemDisplay,
    pub timestamps: Timestamps,
    pub claimed: bool,
    pub ended: bool,
    /// Buy-it-now listing.
    pub bin: bool,
    #[serde(rename = "startingBid")]
    pub starting_bid: i64,
    #[serde(rename = "highestBid")]
    pub highest_bid: i64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
    pub bids: Vec<Bid>,
}

impl Auction {
    fn write_to(&self, buf: &mut impl WireWrite) -> Result<(), ProtocolError> {
        buf.write_string(&self.auction_id)?;
        buf.write_string(&self.seller)?;
        buf.write_string(&self.seller_profile)?;
        buf.write_string(&self.item_bytes)?;
        self.item.write_to(buf)?;
        buf.write_long(self.timestamps.start);
        buf.write_long(self.timestamps.end);
        buf.write_bool(self.claimed);
        buf.write_bool(self.ended);
        buf.write_bool(self.bin);
        buf.write_long(self.starting_bid);
        buf.write_long(self.highest_bid);
        buf.write_long(self.last_updated);
        buf.write_array(&self.bids, |buf, bid| bid.write_to(buf))
    }

    fn read_from(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        let auction_id = buf.read_string()?;
        let seller = buf.read_string()?;
        let seller_profile = buf.read_string()?;
        let item_bytes = buf.read_string()?;
        let item = ItemDisplay::read_from(buf)?;
        let timestamps = Timestamps {
            start: buf.read_long()?,
            end: buf.read_long()?,
        };
        let claimed = buf.read_bool()?;
        let ended = buf.read_bool()?;
        let bin = buf.read_bool()?;
        let starting_bid = buf.read_long()?;
        let highest_bid = buf.read_long()?;
        let last_updated = buf.read_long()?;
        let bids = buf.read_array(Bid::read_from)?;
        Ok(Self {
            auction_id,
            seller,
            seller_profile,
            item_bytes,
            item,
            timestamps,
            claimed,
            ended,
            bin,
            starting_bid,
            highest_bid,
            last_updated,
            bids,
        })
    }
}

/// A page of auction listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auctions {
    pub auctions: Vec<Auction>,
}

impl Packet for Auctions {
    const KIND: PacketKind = PacketKind::Auctions;

    fn write_body(&self, buf: &mut impl WireWrite) -> Result<(), ProtocolError> {
        buf.write_array(&self.auctions, |buf, a| a.write_to(buf))
    }

    fn read_body(buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        let auctions = buf.read_array(Auction::read_from)?;
        Ok(Self { auctions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_body<P: Packet>(frame: &[u8]) -> P {
        let mut buf = ByteBuf::wrap(frame);
        assert_eq!(buf.read_varint().unwrap(), P::ID);
        let packet = P::read_body(&mut buf).unwrap();
        assert_eq!(buf.remaining(), 0, "trailing bytes");
        packet
    }

    #[test]
    fn test_heartbeat_frame_is_id_only() {
        let frame = Heartbeat.encode().unwrap();
        assert_eq!(frame.as_ref(), &[0x02]);
    }

    #[test]
    fn test_metadata_layout() {
        let frame = Metadata {
            heartbeat_interval: 30_000,
        }
        .encode()
        .unwrap();
        assert_eq!(frame.as_ref(), &[0x01, 0x00, 0x00, 0x75, 0x30]);
    }

    #[test]
    fn test_identify_writes_username_first() {
        let frame = Identify {
            username: "ab".into(),
            uuid: "c".into(),
            api_key: "d".into(),
        }
        .encode()
        .unwrap();
        assert_eq!(
            frame.as_ref(),
            &[0x01, 0x02, b'a', b'b', 0x01, b'c', 0x01, b'd']
        );
    }

    #[test]
    fn test_session_create_round_trip() {
        let packet = SessionCreate {
            session_id: "3f2a".into(),
            seq: -3,
        };
        let frame = packet.encode().unwrap();
        assert_eq!(decode_body::<SessionCreate>(&frame), packet);
    }

    #[test]
    fn test_request_auctions_layout() {
        let frame = RequestAuctions {
            filters: vec![Filter::new("rarity", "EPIC")],
            query: "bow".into(),
            order: SortOrder::EndFar,
            start: 40,
            amount: 20,
        }
        .encode()
        .unwrap();

        let mut expected = vec![0x04, 0x01];
        expected.extend_from_slice(b"\x06rarity\x04EPIC\x03bow");
        expected.extend_from_slice(&[0x00, 0x03, 0x00, 0x28, 0x00, 0x14]);
        assert_eq!(frame.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_auction_unknown_rarity_fails_whole_read() {
        let auction = Auction {
            auction_id: "a".into(),
            seller: "s".into(),
            seller_profile: "p".into(),
            item_bytes: "x".into(),
            item: ItemDisplay {
                name: "Hyperion".into(),
                lore: vec![],
                category: Category::Weapon,
                rarity: Rarity::Divine,
            },
            timestamps: Timestamps { start: 1, end: 2 },
            claimed: false,
            ended: false,
            bin: true,
            starting_bid: 10,
            highest_bid: 10,
            last_updated: 2,
            bids: vec![],
        };
        let mut frame = Auctions {
            auctions: vec![auction],
        }
        .encode()
        .unwrap()
        .to_vec();

        // id, count, four one-char strings, "Hyperion", empty lore, category
        let rarity_at = 1 + 1 + 4 * 2 + 9 + 1 + 2;
        assert_eq!(&frame[rarity_at..rarity_at + 2], &[0x00, 0x06]);
        frame[rarity_at + 1] = 0x09;

        let mut buf = ByteBuf::wrap(&frame);
        buf.read_varint().unwrap();
        assert_eq!(
            Auctions::read_body(&mut buf),
            Err(ProtocolError::UnknownCode {
                table: "rarity",
                code: 9
            })
        );
    }

    #[test]
    fn test_serde_field_names_match_wire_names() {
        let identify = Identify {
            username: "u".into(),
            uuid: "id".into(),
            api_key: "k".into(),
        };
        let json = serde_json::to_value(&identify).unwrap();
        assert_eq!(json["apiKey"], "k");

        let filter = Filter::new("category", "armor");
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["type"], "category");
    }
}

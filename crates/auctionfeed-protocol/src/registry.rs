//! Direction registries: numeric ID → packet variant.
//!
//! Packet IDs are only unique within a direction. The two directions are
//! named from the client's side:
//!
//! ```text
//! Outgoing (client → server)      Incoming (server → client)
//!   1  Identify                     1  Metadata
//!   2  Heartbeat                    4  SessionCreate
//!   4  RequestAuctions              5  Auctions
//! ```
//!
//! Each direction has a typed union ([`OutgoingPacket`], [`IncomingPacket`])
//! and a [`Registry`] that encodes and decodes it. Lookup is the only
//! routing there is: no session state, no sequencing. Every message is
//! decoded on its own.

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::buffer::{ByteBuf, DeferredBuf, WireWrite};
use crate::packets::{
    Auctions, Heartbeat, Identify, Metadata, Packet, RequestAuctions,
    SessionCreate,
};
use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Direction / PacketKind
// ---------------------------------------------------------------------------

/// Which way a message travels, from the client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Client → server.
    Outgoing,
    /// Server → client.
    Incoming,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outgoing => f.write_str("outgoing"),
            Self::Incoming => f.write_str("incoming"),
        }
    }
}

/// Every packet variant the protocol knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketKind {
    Identify,
    Heartbeat,
    RequestAuctions,
    Metadata,
    SessionCreate,
    Auctions,
}

impl PacketKind {
    /// The direction-local ID. Part of the wire contract.
    pub const fn id(self) -> u64 {
        match self {
            Self::Identify => 1,
            Self::Heartbeat => 2,
            Self::RequestAuctions => 4,
            Self::Metadata => 1,
            Self::SessionCreate => 4,
            Self::Auctions => 5,
        }
    }

    pub const fn direction(self) -> Direction {
        match self {
            Self::Identify | Self::Heartbeat | Self::RequestAuctions => {
                Direction::Outgoing
            }
            Self::Metadata | Self::SessionCreate | Self::Auctions => {
                Direction::Incoming
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Identify => "Identify",
            Self::Heartbeat => "Heartbeat",
            Self::RequestAuctions => "RequestAuctions",
            Self::Metadata => "Metadata",
            Self::SessionCreate => "SessionCreate",
            Self::Auctions => "Auctions",
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// PacketSet
// ---------------------------------------------------------------------------

/// The closed set of variants that travel in one direction.
///
/// Implemented by the per-direction unions; [`Registry`] is generic over
/// it so both directions share one encode/decode path.
pub trait PacketSet: Sized {
    const DIRECTION: Direction;

    /// The registered variants. IDs must be unique within the slice.
    const KINDS: &'static [PacketKind];

    /// The variant of this value.
    fn kind(&self) -> PacketKind;

    /// Writes the payload of whichever variant this is.
    fn write_body(&self, buf: &mut DeferredBuf) -> Result<(), ProtocolError>;

    /// Reads the payload of `kind`, which is one of [`Self::KINDS`].
    fn read_body(kind: PacketKind, buf: &mut ByteBuf) -> Result<Self, ProtocolError>;
}

/// Client → server messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutgoingPacket {
    Identify(Identify),
    Heartbeat(Heartbeat),
    RequestAuctions(RequestAuctions),
}

impl PacketSet for OutgoingPacket {
    const DIRECTION: Direction = Direction::Outgoing;
    const KINDS: &'static [PacketKind] = &[
        PacketKind::Identify,
        PacketKind::Heartbeat,
        PacketKind::RequestAuctions,
    ];

    fn kind(&self) -> PacketKind {
        match self {
            Self::Identify(_) => PacketKind::Identify,
            Self::Heartbeat(_) => PacketKind::Heartbeat,
            Self::RequestAuctions(_) => PacketKind::RequestAuctions,
        }
    }

    fn write_body(&self, buf: &mut DeferredBuf) -> Result<(), ProtocolError> {
        match self {
            Self::Identify(p) => p.write_body(buf),
            Self::Heartbeat(p) => p.write_body(buf),
            Self::RequestAuctions(p) => p.write_body(buf),
        }
    }

    fn read_body(kind: PacketKind, buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        match kind {
            PacketKind::Identify => Identify::read_body(buf).map(Self::Identify),
            PacketKind::Heartbeat => Heartbeat::read_body(buf).map(Self::Heartbeat),
            PacketKind::RequestAuctions => {
                RequestAuctions::read_body(buf).map(Self::RequestAuctions)
            }
            other => Err(ProtocolError::UnknownPacket {
                id: other.id(),
                direction: Self::DIRECTION,
            }),
        }
    }
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomingPacket {
    Metadata(Metadata),
    SessionCreate(SessionCreate),
    Auctions(Auctions),
}

impl PacketSet for IncomingPacket {
    const DIRECTION: Direction = Direction::Incoming;
    const KINDS: &'static [PacketKind] = &[
        PacketKind::Metadata,
        PacketKind::SessionCreate,
        PacketKind::Auctions,
    ];

    fn kind(&self) -> PacketKind {
        match self {
            Self::Metadata(_) => PacketKind::Metadata,
            Self::SessionCreate(_) => PacketKind::SessionCreate,
            Self::Auctions(_) => PacketKind::Auctions,
        }
    }

    fn write_body(&self, buf: &mut DeferredBuf) -> Result<(), ProtocolError> {
        match self {
            Self::Metadata(p) => p.write_body(buf),
            Self::SessionCreate(p) => p.write_body(buf),
            Self::Auctions(p) => p.write_body(buf),
        }
    }

    fn read_body(kind: PacketKind, buf: &mut ByteBuf) -> Result<Self, ProtocolError> {
        match kind {
            PacketKind::Metadata => Metadata::read_body(buf).map(Self::Metadata),
            PacketKind::SessionCreate => {
                SessionCreate::read_body(buf).map(Self::SessionCreate)
            }
            PacketKind::Auctions => Auctions::read_body(buf).map(Self::Auctions),
            other => Err(ProtocolError::UnknownPacket {
                id: other.id(),
                direction: Self::DIRECTION,
            }),
        }
    }
}

impl From<Identify> for OutgoingPacket {
    fn from(p: Identify) -> Self {
        Self::Identify(p)
    }
}

impl From<Heartbeat> for OutgoingPacket {
    fn from(p: Heartbeat) -> Self {
        Self::Heartbeat(p)
    }
}

impl From<RequestAuctions> for OutgoingPacket {
    fn from(p: RequestAuctions) -> Self {
        Self::RequestAuctions(p)
    }
}

impl From<Metadata> for IncomingPacket {
    fn from(p: Metadata) -> Self {
        Self::Metadata(p)
    }
}

impl From<SessionCreate> for IncomingPacket {
    fn from(p: SessionCreate) -> Self {
        Self::SessionCreate(p)
    }
}

impl From<Auctions> for IncomingPacket {
    fn from(p: Auctions) -> Self {
        Self::Auctions(p)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The result of decoding one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<P> {
    /// The ID read from the frame.
    pub id: u64,
    /// The variant the ID resolved to.
    pub kind: PacketKind,
    pub packet: P,
}

/// ID → variant table for one direction.
///
/// Stateless; use the [`OUTGOING`] and [`INCOMING`] constants.
pub struct Registry<P> {
    _packets: PhantomData<fn() -> P>,
}

/// Client → server registry.
pub const OUTGOING: Registry<OutgoingPacket> = Registry::new();

/// Server → client registry.
pub const INCOMING: Registry<IncomingPacket> = Registry::new();

impl<P> Registry<P> {
    pub const fn new() -> Self {
        Self {
            _packets: PhantomData,
        }
    }
}

impl<P: PacketSet> Registry<P> {
    pub fn direction(&self) -> Direction {
        P::DIRECTION
    }

    /// Resolves a direction-local ID.
    ///
    /// # Errors
    /// [`ProtocolError::UnknownPacket`] if nothing is registered under `id`.
    pub fn lookup(&self, id: u64) -> Result<PacketKind, ProtocolError> {
        P::KINDS
            .iter()
            .copied()
            .find(|kind| kind.id() == id)
            .ok_or(ProtocolError::UnknownPacket {
                id,
                direction: P::DIRECTION,
            })
    }

    /// Frames `packet` under `id`.
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownPacket`] if `id` is not registered.
    /// - [`ProtocolError::PacketMismatch`] if `packet` is not the variant
    ///   registered under `id`.
    pub fn encode(&self, id: u64, packet: &P) -> Result<Bytes, ProtocolError> {
        let expected = self.lookup(id)?;
        let found = packet.kind();
        if expected != found {
            return Err(ProtocolError::PacketMismatch {
                id,
                direction: P::DIRECTION,
                expected,
                found,
            });
        }

        let mut buf = DeferredBuf::new();
        buf.write_varint(id)?;
        packet.write_body(&mut buf)?;
        let frame = buf.finish();
        tracing::trace!(
            direction = %P::DIRECTION,
            id,
            kind = %found,
            len = frame.len(),
            "encoded packet"
        );
        Ok(frame)
    }

    /// Frames `packet` under its own ID.
    pub fn encode_packet(&self, packet: &P) -> Result<Bytes, ProtocolError> {
        self.encode(packet.kind().id(), packet)
    }

    /// Reads the leading ID and decodes the matching variant.
    ///
    /// Trailing bytes after the payload are ignored, as deployed decoders
    /// do.
    ///
    /// # Errors
    /// [`ProtocolError::UnknownPacket`] for an unregistered ID, or any
    /// read error from the payload. No value is produced on error.
    pub fn decode(&self, bytes: &[u8]) -> Result<Decoded<P>, ProtocolError> {
        let mut buf = ByteBuf::wrap(bytes);
        let id = buf.read_varint()?;
        let kind = self.lookup(id)?;
        let packet = P::read_body(kind, &mut buf)?;
        if buf.remaining() > 0 {
            tracing::debug!(
                direction = %P::DIRECTION,
                id,
                kind = %kind,
                trailing = buf.remaining(),
                "ignoring trailing bytes"
            );
        }
        tracing::trace!(direction = %P::DIRECTION, id, kind = %kind, "decoded packet");
        Ok(Decoded { id, kind, packet })
    }
}

impl<P> Default for Registry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for Registry<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Registry<P> {}

impl<P: PacketSet> fmt::Debug for Registry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("direction", &P::DIRECTION)
            .field("kinds", &P::KINDS)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ids_are_unique_per_direction() {
        for kinds in [OutgoingPacket::KINDS, IncomingPacket::KINDS] {
            for (i, a) in kinds.iter().enumerate() {
                for b in &kinds[i + 1..] {
                    assert_ne!(a.id(), b.id(), "{a} and {b} share an id");
                }
            }
        }
    }

    #[test]
    fn test_kinds_registered_in_their_own_direction() {
        for kind in OutgoingPacket::KINDS {
            assert_eq!(kind.direction(), Direction::Outgoing);
        }
        for kind in IncomingPacket::KINDS {
            assert_eq!(kind.direction(), Direction::Incoming);
        }
    }

    #[test]
    fn test_lookup_is_direction_local() {
        assert_eq!(OUTGOING.lookup(1).unwrap(), PacketKind::Identify);
        assert_eq!(INCOMING.lookup(1).unwrap(), PacketKind::Metadata);
        assert_eq!(OUTGOING.lookup(4).unwrap(), PacketKind::RequestAuctions);
        assert_eq!(INCOMING.lookup(4).unwrap(), PacketKind::SessionCreate);
    }

    #[test]
    fn test_lookup_unknown_names_id_and_direction() {
        let err = OUTGOING.lookup(5).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnknownPacket {
                id: 5,
                direction: Direction::Outgoing
            }
        );
        assert_eq!(err.to_string(), "unknown outgoing packet id 5");
    }

    #[test]
    fn test_encode_unknown_id_fails() {
        let packet = OutgoingPacket::Heartbeat(Heartbeat);
        assert!(matches!(
            OUTGOING.encode(3, &packet),
            Err(ProtocolError::UnknownPacket { id: 3, .. })
        ));
    }

    #[test]
    fn test_encode_wrong_variant_for_id_fails() {
        let packet = OutgoingPacket::Heartbeat(Heartbeat);
        assert_eq!(
            OUTGOING.encode(1, &packet),
            Err(ProtocolError::PacketMismatch {
                id: 1,
                direction: Direction::Outgoing,
                expected: PacketKind::Identify,
                found: PacketKind::Heartbeat,
            })
        );
    }

    #[test]
    fn test_encode_packet_uses_own_id() {
        let frame = INCOMING
            .encode_packet(&Metadata { heartbeat_interval: 5 }.into())
            .unwrap();
        assert_eq!(frame[0], 0x01);
    }

    #[test]
    fn test_decode_empty_input_is_eof() {
        assert!(matches!(
            INCOMING.decode(&[]),
            Err(ProtocolError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_decode_same_bytes_differ_by_direction() {
        // id 4 is RequestAuctions outgoing but SessionCreate incoming.
        let frame = INCOMING
            .encode_packet(
                &SessionCreate {
                    session_id: String::new(),
                    seq: 0,
                }
                .into(),
            )
            .unwrap();
        let decoded = INCOMING.decode(&frame).unwrap();
        assert_eq!(decoded.kind, PacketKind::SessionCreate);
        // Outgoing reads the same bytes as a (truncated) RequestAuctions.
        assert!(OUTGOING.decode(&frame).is_err());
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let decoded = OUTGOING.decode(&[0x02, 0xaa]).unwrap();
        assert_eq!(decoded.packet, OutgoingPacket::Heartbeat(Heartbeat));
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Incoming.to_string(), "incoming");
        assert_eq!(PacketKind::RequestAuctions.to_string(), "RequestAuctions");
    }
}

//! Error types for the protocol layer.
//!
//! Every failure the codec can hit is surfaced here, synchronously, to the
//! caller of `encode`/`decode`. Nothing is retried or swallowed: a
//! `ProtocolError` always means "this one message is unusable". Whether
//! that closes the connection is the transport owner's decision.

use crate::registry::{Direction, PacketKind};

/// Errors that can occur while encoding or decoding a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A read walked past the end of the input.
    ///
    /// The message is truncated or malformed. The cursor of the buffer
    /// that produced this is left where the failed read started.
    #[error("unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// The varint did not terminate within 8 bytes.
    #[error("varint is longer than 8 bytes")]
    VarIntTooLong,

    /// The value is above the largest integer a peer can represent
    /// exactly (2^53 - 1).
    #[error("varint value {0} exceeds the safe integer range")]
    VarIntOutOfRange(u64),

    /// No variant is registered under this ID in this direction.
    #[error("unknown {direction} packet id {id}")]
    UnknownPacket { id: u64, direction: Direction },

    /// The value handed to `encode` is not the variant registered under
    /// the requested ID.
    #[error("{direction} packet id {id} is {expected}, got {found}")]
    PacketMismatch {
        id: u64,
        direction: Direction,
        expected: PacketKind,
        found: PacketKind,
    },

    /// A 16-bit enumeration code outside its table.
    #[error("unknown {table} code {code}")]
    UnknownCode { table: &'static str, code: i16 },

    /// A tag string that names no entry of its table.
    #[error("unknown {table} tag {tag:?}")]
    UnknownTag { table: &'static str, tag: String },

    /// A boolean byte other than 0x00 or 0x01.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBoolean(u8),

    /// String payload bytes are not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    /// The decoded characters do not add up to the length prefix.
    #[error("string length prefix does not match its payload")]
    StringLengthMismatch,

    /// A length does not fit the platform's address space.
    #[error("length {0} does not fit in memory")]
    LengthOverflow(u64),
}

//! Byte-level read/write primitives.
//!
//! Two buffer types share one set of writers through the [`WireWrite`]
//! trait:
//!
//! - [`ByteBuf`]: *immediate* mode. Writes land in the live buffer and
//!   can be read back at once. This is what decoding wraps incoming bytes
//!   in.
//! - [`DeferredBuf`]: *deferred* mode. Writes are kept as fragments and
//!   concatenated exactly once by [`DeferredBuf::finish`]. It has no read
//!   operations and `finish` consumes it, so "read before finish" and
//!   "finish twice" cannot be expressed.
//!
//! Wire rules (all fixed-width values are big-endian):
//!
//! ```text
//! varint   7 payload bits per byte, high bit = continuation, at most 8 bytes
//! string   varint(utf16_unit_count) utf8_bytes...
//! short    2 bytes, signed
//! int      4 bytes, signed
//! long     8 bytes, signed
//! float    4 bytes IEEE-754, double 8 bytes IEEE-754
//! boolean  1 byte, 0x00 / 0x01
//! array    varint(count) element...
//! ```

use bytes::{Bytes, BytesMut};

use crate::ProtocolError;

/// Largest integer a peer using IEEE-754 doubles can hold exactly.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// A varint never takes more than this many bytes.
pub const MAX_VARINT_LEN: usize = 8;

const CONTINUATION: u8 = 0x80;
const PAYLOAD: u8 = 0x7f;

/// Number of bytes `value` takes as a varint.
pub fn varint_len(value: u64) -> usize {
    let mut len = 1;
    let mut v = value >> 7;
    while v != 0 {
        len += 1;
        v >>= 7;
    }
    len
}

/// The length prefix written in front of a string.
///
/// The deployed peers count UTF-16 code units, not UTF-8 bytes. For ASCII
/// the two agree.
pub fn string_prefix(value: &str) -> usize {
    value.encode_utf16().count()
}

// ---------------------------------------------------------------------------
// WireWrite
// ---------------------------------------------------------------------------

/// The write half of the codec.
///
/// Implementors only provide [`put_slice`](Self::put_slice); every typed
/// writer is built on it, so both buffer modes produce identical bytes.
pub trait WireWrite {
    /// Appends raw bytes.
    fn put_slice(&mut self, bytes: &[u8]);

    /// Writes an unsigned LEB128 varint.
    ///
    /// # Errors
    /// [`ProtocolError::VarIntOutOfRange`] above [`MAX_SAFE_INTEGER`].
    fn write_varint(&mut self, value: u64) -> Result<(), ProtocolError> {
        if value > MAX_SAFE_INTEGER {
            return Err(ProtocolError::VarIntOutOfRange(value));
        }
        let mut out = [0u8; MAX_VARINT_LEN];
        let mut len = 0;
        let mut v = value;
        while v >= u64::from(CONTINUATION) {
            out[len] = (v as u8 & PAYLOAD) | CONTINUATION;
            len += 1;
            v >>= 7;
        }
        out[len] = v as u8;
        self.put_slice(&out[..=len]);
        Ok(())
    }

    /// Writes a length-prefixed string (see [`string_prefix`]).
    fn write_string(&mut self, value: &str) -> Result<(), ProtocolError> {
        self.write_varint(string_prefix(value) as u64)?;
        self.put_slice(value.as_bytes());
        Ok(())
    }

    fn write_short(&mut self, value: i16) {
        self.put_slice(&value.to_be_bytes());
    }

    fn write_int(&mut self, value: i32) {
        self.put_slice(&value.to_be_bytes());
    }

    fn write_long(&mut self, value: i64) {
        self.put_slice(&value.to_be_bytes());
    }

    fn write_float(&mut self, value: f32) {
        self.put_slice(&value.to_be_bytes());
    }

    fn write_double(&mut self, value: f64) {
        self.put_slice(&value.to_be_bytes());
    }

    fn write_bool(&mut self, value: bool) {
        self.put_slice(&[u8::from(value)]);
    }

    /// Raw passthrough, no length prefix.
    fn write_bytes(&mut self, value: &[u8]) {
        self.put_slice(value);
    }

    /// Writes `varint(count)` followed by each element via `write`.
    fn write_array<T, F>(
        &mut self,
        items: &[T],
        mut write: F,
    ) -> Result<(), ProtocolError>
    where
        Self: Sized,
        F: FnMut(&mut Self, &T) -> Result<(), ProtocolError>,
    {
        self.write_varint(items.len() as u64)?;
        for item in items {
            write(self, item)?;
        }
        Ok(())
    }

    fn write_string_array(
        &mut self,
        items: &[String],
    ) -> Result<(), ProtocolError>
    where
        Self: Sized,
    {
        self.write_array(items, |buf, s| buf.write_string(s))
    }

    fn write_int_array(&mut self, items: &[i32]) -> Result<(), ProtocolError>
    where
        Self: Sized,
    {
        self.write_array(items, |buf, v| {
            buf.write_int(*v);
            Ok(())
        })
    }
}

// ---------------------------------------------------------------------------
// DeferredBuf
// ---------------------------------------------------------------------------

/// A write-only buffer that collects fragments and joins them once.
///
/// ```rust
/// use auctionfeed_protocol::{DeferredBuf, WireWrite};
///
/// let mut buf = DeferredBuf::new();
/// buf.write_varint(300).unwrap();
/// buf.write_short(42);
/// assert_eq!(buf.finish().as_ref(), &[0xac, 0x02, 0x00, 0x2a]);
/// ```
#[derive(Debug, Default)]
pub struct DeferredBuf {
    fragments: Vec<Bytes>,
    len: usize,
}

impl DeferredBuf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Concatenates every fragment into one immutable byte sequence.
    pub fn finish(self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.len);
        for fragment in &self.fragments {
            out.extend_from_slice(fragment);
        }
        out.freeze()
    }
}

impl WireWrite for DeferredBuf {
    fn put_slice(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.len += bytes.len();
        self.fragments.push(Bytes::copy_from_slice(bytes));
    }
}

// ---------------------------------------------------------------------------
// ByteBuf
// ---------------------------------------------------------------------------

/// An immediate-mode buffer with a read cursor.
///
/// Invariant: `0 <= offset <= len`. Every read checks the remaining length
/// first, and a failed read leaves the cursor where it started.
#[derive(Debug, Clone, Default)]
pub struct ByteBuf {
    data: BytesMut,
    offset: usize,
}

impl ByteBuf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a received message for reading, cursor at 0.
    pub fn wrap(data: &[u8]) -> Self {
        Self {
            data: BytesMut::from(data),
            offset: 0,
        }
    }

    /// Current read position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes between the cursor and the end.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// The whole buffer, independent of the cursor.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }

    /// Returns the next `n` bytes without moving the cursor.
    fn peek(&self, n: usize) -> Result<&[u8], ProtocolError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(ProtocolError::UnexpectedEof {
                needed: n,
                remaining,
            });
        }
        Ok(&self.data[self.offset..self.offset + n])
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.peek(N)?);
        self.offset += N;
        Ok(out)
    }

    /// Runs `read`, restoring the cursor if it fails part-way.
    fn rewind_on_err<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, ProtocolError>,
    ) -> Result<T, ProtocolError> {
        let start = self.offset;
        let result = read(self);
        if result.is_err() {
            self.offset = start;
        }
        result
    }

    /// Reads an unsigned LEB128 varint of at most 8 bytes.
    ///
    /// # Errors
    /// - [`ProtocolError::UnexpectedEof`] if the input ends mid-varint.
    /// - [`ProtocolError::VarIntTooLong`] if the 8th byte still has its
    ///   continuation bit set.
    pub fn read_varint(&mut self) -> Result<u64, ProtocolError> {
        let mut value: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let Some(&byte) = self.data.get(self.offset + i) else {
                return Err(ProtocolError::UnexpectedEof {
                    needed: i + 1,
                    remaining: self.remaining(),
                });
            };
            value |= u64::from(byte & PAYLOAD) << (7 * i);
            if byte < CONTINUATION {
                self.offset += i + 1;
                return Ok(value);
            }
        }
        Err(ProtocolError::VarIntTooLong)
    }

    /// Reads a varint used as a count or length.
    fn read_len(&mut self) -> Result<usize, ProtocolError> {
        let len = self.read_varint()?;
        usize::try_from(len).map_err(|_| ProtocolError::LengthOverflow(len))
    }

    /// Reads a string written by [`WireWrite::write_string`].
    ///
    /// The prefix counts UTF-16 units while the payload is UTF-8, so the
    /// prefix is spent as a budget: take `budget` bytes, decode the
    /// complete characters among them, then subtract the UTF-16 length of
    /// what was decoded. A character cut by the chunk boundary is read
    /// whole. Repeats until the budget is zero.
    pub fn read_string(&mut self) -> Result<String, ProtocolError> {
        self.rewind_on_err(|buf| {
            let mut budget = buf.read_len()?;
            let mut value = String::new();
            while budget > 0 {
                let chunk = buf.peek(budget)?;
                let width = match std::str::from_utf8(chunk) {
                    Ok(s) => s.len(),
                    Err(e) if e.valid_up_to() > 0 => e.valid_up_to(),
                    Err(e) if e.error_len().is_none() => {
                        utf8_width(chunk[0])?
                    }
                    Err(_) => return Err(ProtocolError::InvalidUtf8),
                };
                let text = std::str::from_utf8(buf.peek(width)?)
                    .map_err(|_| ProtocolError::InvalidUtf8)?;
                let units = string_prefix(text);
                if units > budget {
                    return Err(ProtocolError::StringLengthMismatch);
                }
                value.push_str(text);
                budget -= units;
                buf.offset += width;
            }
            Ok(value)
        })
    }

    pub fn read_short(&mut self) -> Result<i16, ProtocolError> {
        self.take().map(i16::from_be_bytes)
    }

    pub fn read_int(&mut self) -> Result<i32, ProtocolError> {
        self.take().map(i32::from_be_bytes)
    }

    pub fn read_long(&mut self) -> Result<i64, ProtocolError> {
        self.take().map(i64::from_be_bytes)
    }

    pub fn read_float(&mut self) -> Result<f32, ProtocolError> {
        self.take().map(f32::from_be_bytes)
    }

    pub fn read_double(&mut self) -> Result<f64, ProtocolError> {
        self.take().map(f64::from_be_bytes)
    }

    /// Reads a boolean; any byte besides 0 and 1 is rejected.
    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        let value = match self.peek(1)?[0] {
            0 => false,
            1 => true,
            other => return Err(ProtocolError::InvalidBoolean(other)),
        };
        self.offset += 1;
        Ok(value)
    }

    /// Reads `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes, ProtocolError> {
        let out = Bytes::copy_from_slice(self.peek(n)?);
        self.offset += n;
        Ok(out)
    }

    /// Reads `varint(count)` elements with `read`.
    pub fn read_array<T, F>(&mut self, mut read: F) -> Result<Vec<T>, ProtocolError>
    where
        F: FnMut(&mut Self) -> Result<T, ProtocolError>,
    {
        self.rewind_on_err(|buf| {
            let count = buf.read_len()?;
            // Every element takes at least one byte, which bounds the
            // allocation a hostile count can cause.
            let mut items = Vec::with_capacity(count.min(buf.remaining()));
            for _ in 0..count {
                items.push(read(buf)?);
            }
            Ok(items)
        })
    }

    pub fn read_string_array(&mut self) -> Result<Vec<String>, ProtocolError> {
        self.read_array(Self::read_string)
    }

    pub fn read_int_array(&mut self) -> Result<Vec<i32>, ProtocolError> {
        self.read_array(Self::read_int)
    }
}

impl WireWrite for ByteBuf {
    fn put_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }
}

/// Byte length of the UTF-8 sequence introduced by `lead`.
fn utf8_width(lead: u8) -> Result<usize, ProtocolError> {
    match lead {
        0xc2..=0xdf => Ok(2),
        0xe0..=0xef => Ok(3),
        0xf0..=0xf4 => Ok(4),
        _ => Err(ProtocolError::InvalidUtf8),
    }
}

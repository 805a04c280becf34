//! # Packet Reader
//!
//! Cursor over one framed, decrypted packet body.
//!
//! Every read is fail-soft: when fewer bytes remain than a read needs, the
//! cursor stays where it is and the type's zero value comes back. Handlers
//! rely on this to over-read short or malformed packets without crashing, so
//! a truncated field shows up as `0`, `false` or `""`.
//!
//! Multi-byte integers are little-endian and are assembled one byte at a
//! time, low byte first.
//!
//! ## Usage
//! ```rust
//! use bytes::Bytes;
//! use opcode_socket::core::reader::PacketReader;
//!
//! let mut reader = PacketReader::new(Bytes::from_static(&[0x01, 0x00, 0x2A]));
//! assert_eq!(reader.read_u16(), 1);
//! assert_eq!(reader.read_u8(), 42);
//! assert_eq!(reader.read_u32(), 0); // short read
//! assert_eq!(reader.position(), 3);
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::core::text::{decode_or_raw, ShiftJis, TextEncoding};
use crate::utils::time::unix_timestamp;

/// One framed, decrypted message body.
pub type Request = Bytes;

/// Fail-soft cursor over a [`Request`].
#[derive(Clone)]
pub struct PacketReader {
    packet: Request,
    pos: usize,
    time: i64,
    encoding: Arc<dyn TextEncoding>,
}

impl PacketReader {
    /// Create a reader stamped with the current time and the Shift_JIS text encoding.
    pub fn new(packet: Request) -> Self {
        Self::with_time(packet, unix_timestamp())
    }

    /// Create a reader with an explicit capture time (Unix seconds).
    pub fn with_time(packet: Request, time: i64) -> Self {
        Self {
            packet,
            pos: 0,
            time,
            encoding: Arc::new(ShiftJis),
        }
    }

    /// Replace the text encoding used by the string reads.
    pub fn with_encoding(mut self, encoding: Arc<dyn TextEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    /// Capture time of the packet, in Unix seconds.
    pub fn time(&self) -> i64 {
        self.time
    }

    /// The whole packet, regardless of the cursor.
    pub fn buffer(&self) -> &[u8] {
        &self.packet
    }

    /// The unread remainder.
    pub fn rest(&self) -> &[u8] {
        &self.packet[self.pos..]
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn available(&self) -> usize {
        self.packet.len() - self.pos
    }

    /// Move the cursor. Offsets past the end clamp to the end.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset.min(self.packet.len());
    }

    /// Advance by `amount` bytes, or not at all if fewer remain.
    pub fn skip(&mut self, amount: usize) {
        if amount <= self.available() {
            self.pos += amount;
        }
    }

    #[inline]
    fn has(&self, width: usize) -> bool {
        self.available() >= width
    }

    // Unchecked single-byte read; callers check bounds first.
    #[inline]
    fn next(&mut self) -> u8 {
        let b = self.packet[self.pos];
        self.pos += 1;
        b
    }

    pub fn read_u8(&mut self) -> u8 {
        if !self.has(1) {
            return 0;
        }
        self.next()
    }

    pub fn read_i8(&mut self) -> i8 {
        self.read_u8() as i8
    }

    /// Any non-zero byte is `true`.
    pub fn read_bool(&mut self) -> bool {
        self.read_u8() != 0
    }

    pub fn read_u16(&mut self) -> u16 {
        if !self.has(2) {
            return 0;
        }
        u16::from(self.next()) | (u16::from(self.next()) << 8)
    }

    pub fn read_i16(&mut self) -> i16 {
        self.read_u16() as i16
    }

    pub fn read_u32(&mut self) -> u32 {
        if !self.has(4) {
            return 0;
        }
        (0..4).fold(0u32, |acc, shift| acc | (u32::from(self.next()) << (shift * 8)))
    }

    pub fn read_i32(&mut self) -> i32 {
        self.read_u32() as i32
    }

    pub fn read_u64(&mut self) -> u64 {
        if !self.has(8) {
            return 0;
        }
        (0..8).fold(0u64, |acc, shift| acc | (u64::from(self.next()) << (shift * 8)))
    }

    pub fn read_i64(&mut self) -> i64 {
        self.read_u64() as i64
    }

    /// Read `size` raw bytes.
    ///
    /// A short read returns the one-byte placeholder `[0]` and leaves the
    /// cursor untouched.
    pub fn read_bytes(&mut self, size: usize) -> Bytes {
        if !self.has(size) {
            return Bytes::from_static(&[0]);
        }
        let out = self.packet.slice(self.pos..self.pos + size);
        self.pos += size;
        out
    }

    /// Read `size` bytes of legacy-encoded text.
    ///
    /// Bytes that do not decode are returned as (lossy) UTF-8 instead.
    pub fn read_string(&mut self, size: usize) -> String {
        if !self.has(size) {
            return String::new();
        }
        let raw = self.read_bytes(size);
        decode_or_raw(self.encoding.as_ref(), &raw)
    }

    /// Read a string prefixed by its 16-bit little-endian byte length.
    ///
    /// The prefix is consumed even when the body that follows is short.
    pub fn read_ascii_string(&mut self) -> String {
        let size = self.read_u16();
        self.read_string(usize::from(size))
    }
}

impl fmt::Display for PacketReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Request] ({}) :", self.packet.len())?;
        for b in self.packet.iter() {
            write!(f, " {b:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for PacketReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketReader")
            .field("len", &self.packet.len())
            .field("pos", &self.pos)
            .field("time", &self.time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(bytes: &'static [u8]) -> PacketReader {
        PacketReader::with_time(Bytes::from_static(bytes), 0)
    }

    #[test]
    fn test_little_endian_composition() {
        let mut r = reader(&[0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);
        assert_eq!(r.read_u16(), 0x1234);
        assert_eq!(r.read_u32(), 0x1234_5678);
        assert_eq!(r.available(), 0);
    }

    #[test]
    fn test_signed_reads() {
        let mut r = reader(&[0xFF, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(r.read_i8(), -1);
        assert_eq!(r.read_i16(), -2);
        assert_eq!(r.read_i32(), -1);
    }

    #[test]
    fn test_short_read_leaves_cursor() {
        let mut r = reader(&[1, 2, 3]);
        assert_eq!(r.read_u32(), 0);
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_u64(), 0);
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_u16(), 0x0201);
        assert_eq!(r.read_u16(), 0);
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn test_read_bytes_placeholder() {
        let mut r = reader(&[9, 8]);
        assert_eq!(r.read_bytes(3).as_ref(), &[0]);
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_bytes(2).as_ref(), &[9, 8]);
    }

    #[test]
    fn test_seek_clamps() {
        let mut r = reader(&[1, 2, 3, 4]);
        r.seek(2);
        assert_eq!(r.rest(), &[3, 4]);
        r.seek(100);
        assert_eq!(r.position(), 4);
        assert_eq!(r.available(), 0);
        assert_eq!(r.buffer(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_ascii_string_short_body_consumes_prefix() {
        let mut r = reader(&[0x05, 0x00, b'a', b'b']);
        assert_eq!(r.read_ascii_string(), "");
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn test_display_hex() {
        let r = reader(&[0x0A, 0xFF]);
        assert_eq!(r.to_string(), "[Request] (2) : 0A FF");
    }
}

//! # Packet Writer
//!
//! Append-only builder for outbound packets. All integers are written
//! little-endian. The buffer lives in memory, so writes cannot fail.

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::core::text::{encode_or_raw, ShiftJis, TextEncoding};

/// Default capacity for a fresh writer
const DEFAULT_CAPACITY: usize = 64;

/// Typed byte builder for response packets.
pub struct PacketWriter {
    buf: BytesMut,
    encoding: Arc<dyn TextEncoding>,
}

impl Default for PacketWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            encoding: Arc::new(ShiftJis),
        }
    }

    /// Replace the text encoding used by [`write_ascii_string`](Self::write_ascii_string).
    pub fn with_encoding(mut self, encoding: Arc<dyn TextEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    /// Writes `1` or `0`.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.put_i16_le(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write a 16-bit length prefix followed by the legacy-encoded text.
    ///
    /// Text the encoding cannot represent is written as raw UTF-8, with the
    /// prefix set to the UTF-8 byte count. Encoded text longer than
    /// `u16::MAX` bytes is cut to that length so prefix and body agree.
    pub fn write_ascii_string(&mut self, text: &str) {
        let encoded = encode_or_raw(self.encoding.as_ref(), text);
        let len = encoded.len().min(usize::from(u16::MAX));
        if len < encoded.len() {
            warn!(bytes = encoded.len(), "String truncated to fit its length prefix");
        }
        self.write_u16(len as u16);
        self.write_bytes(&encoded[..len]);
    }

    /// A one-byte key followed by a 32-bit value, as used by stat update lists.
    pub fn write_key_value(&mut self, key: u8, value: u32) {
        self.write_u8(key);
        self.write_u32(value);
    }

    /// Append `amount` zero bytes.
    pub fn skip(&mut self, amount: usize) {
        self.buf.put_bytes(0, amount);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer, returning its buffer.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

//! # Legacy Text Encoding
//!
//! Strings on the wire are stored in a legacy double-byte encoding (Shift_JIS
//! by default). The transform is pluggable through [`TextEncoding`]; the
//! reader and writer apply their own fallbacks when it fails, so an encoding
//! never surfaces an error to packet code.

use encoding_rs::SHIFT_JIS;

/// A reversible text transform between Rust strings and wire bytes.
///
/// Returning `None` signals failure. Callers fall back to raw UTF-8 bytes.
pub trait TextEncoding: Send + Sync {
    fn encode(&self, text: &str) -> Option<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Option<String>;
}

/// Shift_JIS, the encoding used by legacy Japanese game clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftJis;

impl TextEncoding for ShiftJis {
    fn encode(&self, text: &str) -> Option<Vec<u8>> {
        let (encoded, _, had_errors) = SHIFT_JIS.encode(text);
        if had_errors {
            return None;
        }
        Some(encoded.into_owned())
    }

    fn decode(&self, bytes: &[u8]) -> Option<String> {
        SHIFT_JIS
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
    }
}

/// Pass-through UTF-8, for protocols that never used a legacy encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl TextEncoding for Utf8 {
    fn encode(&self, text: &str) -> Option<Vec<u8>> {
        Some(text.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Option<String> {
        std::str::from_utf8(bytes).ok().map(str::to_owned)
    }
}

/// Decode with the raw-bytes fallback.
pub(crate) fn decode_or_raw(encoding: &dyn TextEncoding, bytes: &[u8]) -> String {
    match encoding.decode(bytes) {
        Some(text) => text,
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Encode with the raw UTF-8 fallback.
pub(crate) fn encode_or_raw(encoding: &dyn TextEncoding, text: &str) -> Vec<u8> {
    match encoding.encode(text) {
        Some(bytes) => bytes,
        None => text.as_bytes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_jis_roundtrip() {
        let encoded = ShiftJis.encode("メイプル").expect("encodable");
        assert_eq!(encoded.len(), 8);
        assert_eq!(ShiftJis.decode(&encoded).as_deref(), Some("メイプル"));
    }

    #[test]
    fn test_shift_jis_ascii_is_identity() {
        assert_eq!(ShiftJis.encode("admin").as_deref(), Some(&b"admin"[..]));
    }

    #[test]
    fn test_shift_jis_unmappable_falls_back() {
        // Emoji have no Shift_JIS mapping.
        assert!(ShiftJis.encode("hi 🎮").is_none());
        assert_eq!(encode_or_raw(&ShiftJis, "hi 🎮"), "hi 🎮".as_bytes());
    }

    #[test]
    fn test_invalid_bytes_decode_raw() {
        // 0x81 is a lead byte with no valid trail.
        let bytes = [b'a', 0x81];
        assert!(ShiftJis.decode(&bytes).is_none());
        assert_eq!(decode_or_raw(&ShiftJis, &bytes), String::from_utf8_lossy(&bytes));
    }
}

//! # Frame Length
//!
//! Each frame on the wire is `[header][body]`. How the body length is derived
//! from the header is protocol specific (often obfuscated), so it is supplied
//! by the application through [`FrameLength`]. It must be deterministic.

/// Computes a frame's body length from its raw header bytes.
pub trait FrameLength: Send + Sync {
    fn frame_length(&self, header: &[u8]) -> usize;
}

impl<F> FrameLength for F
where
    F: Fn(&[u8]) -> usize + Send + Sync,
{
    fn frame_length(&self, header: &[u8]) -> usize {
        self(header)
    }
}

/// Treats the header as a plain little-endian unsigned length.
///
/// Headers longer than eight bytes only contribute their first eight.
#[derive(Debug, Clone, Copy, Default)]
pub struct LittleEndianLength;

impl FrameLength for LittleEndianLength {
    fn frame_length(&self, header: &[u8]) -> usize {
        header
            .iter()
            .take(8)
            .enumerate()
            .fold(0u64, |acc, (i, b)| acc | (u64::from(*b) << (i * 8))) as usize
    }
}

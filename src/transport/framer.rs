//! # Header/Body Framer
//!
//! Per-session framing state machine. A session alternates strictly between
//! reading a fixed-size header and reading the body length that header
//! announces; frames are never pipelined.
//!
//! The framer only owns buffers and state. The session loop fills
//! [`Framer::spare`] from the socket, reports how much it read through
//! [`Framer::advance`], then drains finished bodies with
//! [`Framer::next_body`]. Bytes that arrive before a read deadline expires
//! stay in the buffer, so a frame split over several segments or deadlines is
//! still assembled correctly.

use bytes::BytesMut;

use crate::core::frame::FrameLength;
use crate::error::{Result, ServerError};

/// Where a session is in the header/body cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    AwaitingHeader,
    AwaitingBody,
}

#[derive(Debug)]
pub struct Framer {
    phase: FramePhase,
    header_size: usize,
    max_frame_length: usize,
    expected: usize,
    filled: usize,
    buf: BytesMut,
}

impl Framer {
    pub fn new(header_size: usize, max_frame_length: usize) -> Self {
        let mut buf = BytesMut::with_capacity(header_size);
        buf.resize(header_size, 0);
        Self {
            phase: FramePhase::AwaitingHeader,
            header_size,
            max_frame_length,
            expected: header_size,
            filled: 0,
            buf,
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Bytes the current phase still needs.
    pub fn remaining(&self) -> usize {
        self.expected - self.filled
    }

    /// Unfilled part of the current read target.
    pub fn spare(&mut self) -> &mut [u8] {
        &mut self.buf[self.filled..self.expected]
    }

    /// Record `n` bytes written into [`spare`](Self::spare).
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.filled += n;
    }

    /// Run every transition the buffered bytes allow and return the next
    /// complete body, if there is one.
    ///
    /// A completed header calls `frame_length` and moves to the body phase; a
    /// zero-length body completes immediately. A length above the configured
    /// ceiling fails with [`ServerError::OversizedPacket`].
    pub fn next_body(&mut self, frame_length: &dyn FrameLength) -> Result<Option<BytesMut>> {
        loop {
            if self.filled < self.expected {
                return Ok(None);
            }

            match self.phase {
                FramePhase::AwaitingHeader => {
                    let length = frame_length.frame_length(&self.buf[..self.header_size]);
                    if length > self.max_frame_length {
                        return Err(ServerError::OversizedPacket(length));
                    }
                    self.reset(FramePhase::AwaitingBody, length);
                }
                FramePhase::AwaitingBody => {
                    let body = self.buf.split_to(self.expected);
                    self.reset(FramePhase::AwaitingHeader, self.header_size);
                    return Ok(Some(body));
                }
            }
        }
    }

    fn reset(&mut self, phase: FramePhase, expected: usize) {
        self.phase = phase;
        self.expected = expected;
        self.filled = 0;
        self.buf.clear();
        self.buf.resize(expected, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::LittleEndianLength;

    fn feed(framer: &mut Framer, bytes: &[u8]) {
        let spare = framer.spare();
        spare[..bytes.len()].copy_from_slice(bytes);
        framer.advance(bytes.len());
    }

    #[test]
    fn test_header_then_body() {
        let mut framer = Framer::new(4, 1024);
        assert_eq!(framer.phase(), FramePhase::AwaitingHeader);

        feed(&mut framer, &[0x04, 0, 0, 0]);
        assert!(framer.next_body(&LittleEndianLength).unwrap().is_none());
        assert_eq!(framer.phase(), FramePhase::AwaitingBody);
        assert_eq!(framer.remaining(), 4);

        feed(&mut framer, &[0x01, 0x00, 0xAB, 0xCD]);
        let body = framer.next_body(&LittleEndianLength).unwrap().unwrap();
        assert_eq!(body.as_ref(), &[0x01, 0x00, 0xAB, 0xCD]);
        assert_eq!(framer.phase(), FramePhase::AwaitingHeader);
        assert_eq!(framer.remaining(), 4);
    }

    #[test]
    fn test_partial_reads_accumulate() {
        let mut framer = Framer::new(4, 1024);
        feed(&mut framer, &[0x02, 0]);
        assert!(framer.next_body(&LittleEndianLength).unwrap().is_none());
        assert_eq!(framer.phase(), FramePhase::AwaitingHeader);
        feed(&mut framer, &[0, 0]);
        assert!(framer.next_body(&LittleEndianLength).unwrap().is_none());
        feed(&mut framer, &[0x07]);
        assert!(framer.next_body(&LittleEndianLength).unwrap().is_none());
        feed(&mut framer, &[0x08]);
        let body = framer.next_body(&LittleEndianLength).unwrap().unwrap();
        assert_eq!(body.as_ref(), &[0x07, 0x08]);
    }

    #[test]
    fn test_zero_length_body_completes_immediately() {
        let mut framer = Framer::new(4, 1024);
        feed(&mut framer, &[0, 0, 0, 0]);
        let body = framer.next_body(&LittleEndianLength).unwrap().unwrap();
        assert!(body.is_empty());
        assert_eq!(framer.phase(), FramePhase::AwaitingHeader);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut framer = Framer::new(2, 100);
        feed(&mut framer, &[0xFF, 0x00]);
        let err = framer.next_body(&LittleEndianLength).unwrap_err();
        assert!(matches!(err, ServerError::OversizedPacket(255)));
    }
}

//! # Opcode Strategy
//!
//! The opcode width is fixed per server by its type parameter: `u8` for
//! narrow (one byte) protocols, `u16` for wide (two bytes, little-endian)
//! ones. The dispatch table shares the same type, so a handler can never be
//! registered under a key of the wrong width.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::core::reader::PacketReader;
use crate::core::writer::PacketWriter;

/// Wire width of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpcodeWidth {
    /// One byte
    Narrow,
    /// Two bytes, little-endian
    Wide,
}

impl OpcodeWidth {
    pub fn bytes(self) -> usize {
        match self {
            OpcodeWidth::Narrow => 1,
            OpcodeWidth::Wide => 2,
        }
    }
}

/// An opcode value that knows how to read and write itself.
pub trait Opcode: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    const WIDTH: OpcodeWidth;

    /// Read one opcode from the front of the reader (fail-soft: `0` on short input).
    fn read_from(reader: &mut PacketReader) -> Self;

    fn write_to(self, writer: &mut PacketWriter);

    /// Widened value, for logging.
    fn as_u16(self) -> u16;
}

impl Opcode for u8 {
    const WIDTH: OpcodeWidth = OpcodeWidth::Narrow;

    fn read_from(reader: &mut PacketReader) -> Self {
        reader.read_u8()
    }

    fn write_to(self, writer: &mut PacketWriter) {
        writer.write_u8(self);
    }

    fn as_u16(self) -> u16 {
        u16::from(self)
    }
}

impl Opcode for u16 {
    const WIDTH: OpcodeWidth = OpcodeWidth::Wide;

    fn read_from(reader: &mut PacketReader) -> Self {
        reader.read_u16()
    }

    fn write_to(self, writer: &mut PacketWriter) {
        writer.write_u16(self);
    }

    fn as_u16(self) -> u16 {
        self
    }
}

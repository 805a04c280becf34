//! # Core Protocol Components
//!
//! Binary codec primitives and the pieces of the wire format that are fixed
//! at configuration time.
//!
//! ## Components
//! - **Reader**: fail-soft cursor over a packet body
//! - **Writer**: append-only packet builder
//! - **Text**: legacy double-byte string encoding with fallback
//! - **Opcode**: narrow (`u8`) or wide (`u16`) opcode strategy
//! - **Frame**: header-to-body-length collaborator
//!
//! ## Wire Format
//! ```text
//! [Header(N)] [Body(frame_length(header))]
//! Body after decryption: [Opcode(1|2)] [Payload...]
//! ```

pub mod frame;
pub mod opcode;
pub mod reader;
pub mod text;
pub mod writer;

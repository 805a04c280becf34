//! # Error Types
//!
//! Error handling for the socket server.
//!
//! Only connection plumbing and configuration can fail. Packet parsing never
//! produces an error: short or malformed packets are absorbed by the fail-soft
//! reads in [`crate::core::reader::PacketReader`], and text transform failures
//! fall back to raw bytes.
//!
//! ## Error Categories
//! - **I/O Errors**: bind, accept and socket failures
//! - **Framing Errors**: frame lengths above the configured ceiling
//! - **Configuration Errors**: invalid or unreadable configuration
//!
//! ## Example Usage
//! ```rust
//! use opcode_socket::config::ServerConfig;
//! use opcode_socket::error::Result;
//! use tracing::error;
//!
//! fn load() -> Result<ServerConfig> {
//!     let config = ServerConfig::from_toml("port = 8484")?;
//!     config.validate_strict()?;
//!     Ok(config)
//! }
//!
//! if let Err(e) = load() {
//!     error!(error = %e, "Bad configuration");
//! }
//! ```

use std::io;
use thiserror::Error;

use crate::core::opcode::OpcodeWidth;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    pub const ERR_EMPTY_ADDRESS: &str = "Server address cannot be empty";
    pub const ERR_HEADER_SIZE: &str = "Header size must be between 1 and 64 bytes";
    pub const ERR_ZERO_FRAME_LIMIT: &str = "Max frame length must be greater than 0";
}

// ServerError is the primary error type for all server operations
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Frame too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Timeout occurred")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configured opcode width {configured:?} does not match server opcode width {expected:?}")]
    OpcodeWidthMismatch {
        configured: OpcodeWidth,
        expected: OpcodeWidth,
    },
}

impl ServerError {
    /// Whether this error is part of a normal connection shutdown rather than a failure.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ServerError::ConnectionClosed => true,
            ServerError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// Type alias for Results using ServerError
pub type Result<T> = std::result::Result<T, ServerError>;

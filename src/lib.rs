//! # opcode-socket
//!
//! TCP server core for length-framed, opcode-dispatched binary protocols,
//! the header/body packet cycle used by many legacy game clients.
//!
//! ## Architecture
//! - **core**: fail-soft packet reader, packet writer, legacy text encoding,
//!   opcode width strategy and the frame-length collaborator
//! - **protocol**: session identity, lifecycle hooks, dispatch table
//! - **transport**: accept loop, session loops, header/body framer
//! - **config**: serializable server and logging configuration
//! - **utils**: logging setup, metrics, timeouts
//!
//! ## Example
//! ```rust,no_run
//! use opcode_socket::config::ServerConfig;
//! use opcode_socket::protocol::dispatcher::DispatchTable;
//! use opcode_socket::transport::Server;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> opcode_socket::Result<()> {
//!     let handlers = DispatchTable::<u16>::builder()
//!         .register(0x0001, |session, mut reader| {
//!             let name = reader.read_ascii_string();
//!             tracing::info!(%session, %name, "Login request");
//!         })
//!         .build();
//!
//!     let server = Server::builder(ServerConfig::default())
//!         .handlers(handlers)
//!         .build()?;
//!
//!     server.run(CancellationToken::new()).await
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::core::opcode::{Opcode, OpcodeWidth};
pub use crate::core::reader::{PacketReader, Request};
pub use crate::core::writer::PacketWriter;
pub use crate::error::{Result, ServerError};
pub use crate::protocol::dispatcher::DispatchTable;
pub use crate::protocol::session::{SessionHandle, SessionId};
pub use crate::transport::server::{Server, ServerBuilder};

//! # Transport Layer
//!
//! TCP listener, per-connection session loops and the header/body framing
//! state machine that feeds the dispatcher.

pub mod framer;
pub mod server;

pub use server::{Server, ServerBuilder};

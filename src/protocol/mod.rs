//! # Protocol Layer
//!
//! Session identity, lifecycle hooks and opcode dispatch.
//!
//! ## Components
//! - **Session**: random session identifiers and the outbound handle
//! - **Hooks**: creator / decryptor / destroyer callbacks
//! - **Dispatcher**: immutable opcode-to-handler table

pub mod dispatcher;
pub mod hooks;
pub mod session;

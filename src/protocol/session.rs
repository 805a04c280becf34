//! # Sessions
//!
//! A session is one accepted connection. Its read side belongs to the
//! session loop; the write side is shared with the application through
//! [`SessionHandle`], which the creator hook receives.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tracing::trace;

use crate::error::Result;
use crate::utils::timeout::{with_timeout_error, WRITE_TIMEOUT};

/// Random 128-bit session identifier laid out as a version-4 UUID.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u128);

impl SessionId {
    const VERSION_MASK: u128 = 0xF << 76;
    const VERSION_4: u128 = 0x4 << 76;
    const VARIANT_MASK: u128 = 0x3 << 62;
    const VARIANT_RFC4122: u128 = 0x2 << 62;

    /// Draw a fresh identifier from the thread-local RNG.
    pub fn random() -> Self {
        let bits: u128 = rand::random();
        let bits = (bits & !Self::VERSION_MASK) | Self::VERSION_4;
        let bits = (bits & !Self::VARIANT_MASK) | Self::VARIANT_RFC4122;
        SessionId(bits)
    }

    pub const fn from_u128(value: u128) -> Self {
        SessionId(value)
    }

    pub const fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xFFFF_FFFF_FFFF
        )
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({self})")
    }
}

/// Cloneable handle to a session's outbound half.
///
/// Bytes passed to [`send`](Self::send) go out as-is; framing and encryption
/// of responses are up to the application.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    peer: SocketAddr,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    write_timeout: Duration,
}

impl SessionHandle {
    pub(crate) fn new(id: SessionId, peer: SocketAddr, writer: OwnedWriteHalf) -> Self {
        Self {
            id,
            peer,
            writer: Arc::new(Mutex::new(writer)),
            write_timeout: WRITE_TIMEOUT,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Write `bytes` to the peer, failing with a timeout after the write deadline.
    pub async fn send(&self, bytes: &[u8]) -> Result<()> {
        with_timeout_error(
            async {
                let mut writer = self.writer.lock().await;
                writer.write_all(bytes).await?;
                trace!(session = %self.id, bytes = bytes.len(), "Wrote to session");
                Ok(())
            },
            self.write_timeout,
        )
        .await
    }

    /// Shut down the write direction. Later sends fail.
    pub async fn close(&self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await?;
        Ok(())
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .finish()
    }
}

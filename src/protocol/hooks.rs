//! # Session Lifecycle Hooks
//!
//! Three application callbacks bracket every session:
//! - **creator** runs once, right after accept and before the first read
//! - **decryptor** transforms every framed body before dispatch
//! - **destroyer** runs once, after the connection is closed
//!
//! All three default to no-ops (identity for the decryptor).

use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;

use crate::protocol::session::{SessionHandle, SessionId};

pub type Creator = Arc<dyn Fn(SessionId, SessionHandle) + Send + Sync>;
pub type Decryptor = Arc<dyn Fn(SessionId, BytesMut) -> BytesMut + Send + Sync>;
pub type Destroyer = Arc<dyn Fn(SessionId) + Send + Sync>;

/// The set of lifecycle callbacks shared by every session of a server.
#[derive(Clone)]
pub struct SessionHooks {
    creator: Creator,
    decryptor: Decryptor,
    destroyer: Destroyer,
}

impl Default for SessionHooks {
    fn default() -> Self {
        Self {
            creator: Arc::new(|_, _| {}),
            decryptor: Arc::new(|_, body| body),
            destroyer: Arc::new(|_| {}),
        }
    }
}

impl SessionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_creator<F>(mut self, creator: F) -> Self
    where
        F: Fn(SessionId, SessionHandle) + Send + Sync + 'static,
    {
        self.creator = Arc::new(creator);
        self
    }

    /// The decryptor receives the body by value so it can decrypt in place.
    pub fn with_decryptor<F>(mut self, decryptor: F) -> Self
    where
        F: Fn(SessionId, BytesMut) -> BytesMut + Send + Sync + 'static,
    {
        self.decryptor = Arc::new(decryptor);
        self
    }

    pub fn with_destroyer<F>(mut self, destroyer: F) -> Self
    where
        F: Fn(SessionId) + Send + Sync + 'static,
    {
        self.destroyer = Arc::new(destroyer);
        self
    }

    pub(crate) fn create(&self, id: SessionId, handle: SessionHandle) {
        (self.creator)(id, handle)
    }

    pub(crate) fn decrypt(&self, id: SessionId, body: BytesMut) -> BytesMut {
        (self.decryptor)(id, body)
    }

    pub(crate) fn destroy(&self, id: SessionId) {
        (self.destroyer)(id)
    }
}

impl fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHooks").finish_non_exhaustive()
    }
}

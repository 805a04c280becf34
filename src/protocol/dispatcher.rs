use crate::core::opcode::Opcode;
use crate::core::reader::PacketReader;
use crate::protocol::session::SessionId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// A message handler. Receives the reader positioned just past the opcode.
pub type Handler = Arc<dyn Fn(SessionId, PacketReader) + Send + Sync + 'static>;

/// What happened to one dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome<O> {
    Handled(O),
    Unhandled(O),
}

/// Immutable opcode-to-handler routing table.
///
/// Built once with [`DispatchTable::builder`] before the server starts, then
/// shared read-only by every session, so lookups take no lock.
pub struct DispatchTable<O: Opcode> {
    handlers: HashMap<O, Handler>,
}

impl<O: Opcode> Default for DispatchTable<O> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<O: Opcode> DispatchTable<O> {
    pub fn builder() -> DispatchTableBuilder<O> {
        DispatchTableBuilder {
            handlers: HashMap::new(),
        }
    }

    pub fn get(&self, opcode: O) -> Option<&Handler> {
        self.handlers.get(&opcode)
    }

    pub fn contains(&self, opcode: O) -> bool {
        self.handlers.contains_key(&opcode)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Read the opcode off the front of `reader` and run its handler, if any.
    pub fn dispatch(&self, session: SessionId, mut reader: PacketReader) -> DispatchOutcome<O> {
        let opcode = O::read_from(&mut reader);
        match self.handlers.get(&opcode) {
            Some(handler) => {
                handler(session, reader);
                DispatchOutcome::Handled(opcode)
            }
            None => DispatchOutcome::Unhandled(opcode),
        }
    }
}

impl<O: Opcode> fmt::Debug for DispatchTable<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("opcodes", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects handlers for a [`DispatchTable`].
pub struct DispatchTableBuilder<O: Opcode> {
    handlers: HashMap<O, Handler>,
}

impl<O: Opcode> DispatchTableBuilder<O> {
    /// Register `handler` for `opcode`. A later registration replaces an earlier one.
    pub fn register<F>(mut self, opcode: O, handler: F) -> Self
    where
        F: Fn(SessionId, PacketReader) + Send + Sync + 'static,
    {
        if self.handlers.insert(opcode, Arc::new(handler)).is_some() {
            warn!(opcode = ?opcode, "Replacing previously registered handler");
        }
        self
    }

    pub fn build(self) -> DispatchTable<O> {
        DispatchTable {
            handlers: self.handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::Mutex;

    #[test]
    fn test_handler_sees_payload_after_opcode() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let table = DispatchTable::<u16>::builder()
            .register(0x0001, move |_, reader| {
                sink.lock().unwrap().extend_from_slice(reader.rest());
            })
            .build();

        let reader = PacketReader::new(Bytes::from_static(&[0x01, 0x00, 0xAB, 0xCD]));
        let outcome = table.dispatch(SessionId::random(), reader);

        assert_eq!(outcome, DispatchOutcome::Handled(1));
        assert_eq!(*seen.lock().unwrap(), vec![0xAB, 0xCD]);
    }

    #[test]
    fn test_unknown_opcode_is_unhandled() {
        let table = DispatchTable::<u8>::builder().register(0x10, |_, _| {}).build();
        let reader = PacketReader::new(Bytes::from_static(&[0x20, 0x00]));
        assert_eq!(
            table.dispatch(SessionId::random(), reader),
            DispatchOutcome::Unhandled(0x20)
        );
        assert!(table.contains(0x10));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_empty_body_reads_opcode_zero() {
        let table: DispatchTable<u16> = DispatchTable::default();
        assert!(table.is_empty());
        let reader = PacketReader::new(Bytes::new());
        assert_eq!(
            table.dispatch(SessionId::random(), reader),
            DispatchOutcome::Unhandled(0)
        );
    }
}

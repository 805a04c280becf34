//! # TCP Server
//!
//! Accept loop and per-connection session loops.
//!
//! Every accepted connection gets its own task, which is the only reader of
//! that socket. The task drives a [`Framer`] through the header/body cycle,
//! runs the decryptor on each finished body and spawns the dispatch of that
//! body as an independent task, so a slow handler never stalls the reads.
//! Dispatch tasks are spawned in arrival order but may finish in any order.
//!
//! ## Lifecycle
//! - creator hook: once, right after accept, before the first read
//! - read deadline expiry: re-poll, no state change
//! - EOF, socket error, oversized frame or shutdown: close and run the
//!   destroyer hook exactly once
//!
//! ## Shutdown
//! A single [`CancellationToken`] stops the accept loop and every session.
//! Sessions race each read against the token, so an idle session notices
//! the shutdown immediately rather than at its next deadline. `serve` then
//! waits up to the configured shutdown timeout for sessions and in-flight
//! handlers.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, info_span, instrument, trace, warn, Instrument};

use crate::config::ServerConfig;
use crate::core::frame::{FrameLength, LittleEndianLength};
use crate::core::opcode::Opcode;
use crate::core::reader::PacketReader;
use crate::core::text::{ShiftJis, TextEncoding};
use crate::error::{Result, ServerError};
use crate::protocol::dispatcher::{DispatchOutcome, DispatchTable};
use crate::protocol::hooks::SessionHooks;
use crate::protocol::session::{SessionHandle, SessionId};
use crate::transport::framer::Framer;
use crate::utils::metrics::{Metrics, MetricsSnapshot};
use crate::utils::timeout::ACCEPT_BACKOFF;

/// What the accept loop does after a failed `accept`.
#[derive(Debug)]
enum AcceptFailure {
    /// Counted and logged; back off, then accept again.
    Retry,
    /// The listener is unusable.
    Fatal(ServerError),
}

struct Shared<O: Opcode> {
    config: ServerConfig,
    hooks: SessionHooks,
    frame_length: Box<dyn FrameLength>,
    table: DispatchTable<O>,
    encoding: Arc<dyn TextEncoding>,
    metrics: Arc<Metrics>,
}

impl<O: Opcode> Shared<O> {
    fn dispatch(&self, session: SessionId, body: Bytes) {
        let reader = PacketReader::new(body).with_encoding(Arc::clone(&self.encoding));
        match self.table.dispatch(session, reader) {
            DispatchOutcome::Handled(opcode) => {
                self.metrics.message_dispatched();
                trace!(session = %session, opcode = opcode.as_u16(), "Dispatched message");
            }
            DispatchOutcome::Unhandled(opcode) => {
                self.metrics.message_unhandled();
                info!(
                    session = %session,
                    opcode = %format_args!("0x{:02X}", opcode.as_u16()),
                    "Read an unhandled message"
                );
            }
        }
    }
}

/// Length-framed, opcode-dispatched TCP server.
///
/// `O` is the opcode type: `u8` for one-byte opcodes, `u16` for two-byte ones.
pub struct Server<O: Opcode> {
    shared: Arc<Shared<O>>,
}

impl<O: Opcode> Clone for Server<O> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<O: Opcode> fmt::Debug for Server<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.shared.config)
            .field("table", &self.shared.table)
            .finish_non_exhaustive()
    }
}

impl<O: Opcode> Server<O> {
    pub fn builder(config: ServerConfig) -> ServerBuilder<O> {
        ServerBuilder::new(config)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.shared.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Bind a listener on the configured address and port.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.shared.config.bind_address();
        info!(address = %addr, "Starting tcp server");
        TcpListener::bind(&addr).await.map_err(|e| {
            error!(address = %addr, error = %e, "Error listening");
            ServerError::Io(e)
        })
    }

    /// Bind and serve until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Bind and serve until CTRL+C.
    pub async fn run_until_ctrl_c(&self) -> Result<()> {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received CTRL+C signal, shutting down");
                trigger.cancel();
            }
        });
        self.run(shutdown).await
    }

    /// Serve connections from an already bound listener.
    ///
    /// Returns once `shutdown` is cancelled, or with an error if the listener
    /// fails unrecoverably. Either way every session is told to stop and is
    /// given up to `shutdown_timeout` to finish.
    #[instrument(skip_all, fields(address = ?listener.local_addr().ok()))]
    pub async fn serve(&self, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
        let sessions = shutdown.child_token();
        let tracker = TaskTracker::new();

        let result = self.accept_loop(&listener, &sessions, &tracker).await;

        info!("Closing listener");
        drop(listener);
        sessions.cancel();
        tracker.close();

        let wait = tokio::time::timeout(self.shared.config.shutdown_timeout, tracker.wait());
        if wait.await.is_err() {
            warn!(
                remaining = tracker.len(),
                "Shutdown timeout reached with tasks still running"
            );
        }

        self.shared.metrics.log_metrics();
        result
    }

    async fn accept_loop(
        &self,
        listener: &TcpListener,
        sessions: &CancellationToken,
        tracker: &TaskTracker,
    ) -> Result<()> {
        loop {
            let accepted = tokio::select! {
                biased;
                _ = sessions.cancelled() => {
                    info!("Listener stopped accepting new connections");
                    return Ok(());
                }
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    info!(peer = %peer, "Client connected");
                    let shared = Arc::clone(&self.shared);
                    let shutdown = sessions.clone();
                    let dispatch_tracker = tracker.clone();
                    tracker.spawn(run_session(shared, stream, peer, shutdown, dispatch_tracker));
                }
                Err(e) => match self.accept_failed(e) {
                    AcceptFailure::Retry => tokio::time::sleep(ACCEPT_BACKOFF).await,
                    AcceptFailure::Fatal(err) => return Err(err),
                },
            }
        }
    }

    fn accept_failed(&self, e: io::Error) -> AcceptFailure {
        if is_fatal_accept_error(&e) {
            error!(error = %e, "Unrecoverable error accepting connection");
            return AcceptFailure::Fatal(ServerError::Io(e));
        }
        self.shared.metrics.accept_error();
        info!(error = %e, "Error accepting connection");
        AcceptFailure::Retry
    }
}

fn is_fatal_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::InvalidInput | io::ErrorKind::PermissionDenied | io::ErrorKind::Unsupported
    )
}

/// Own one connection from accept to teardown.
///
/// The destroyer is called only here, after the read loop has returned, and
/// this function runs once per accepted connection.
async fn run_session<O: Opcode>(
    shared: Arc<Shared<O>>,
    stream: TcpStream,
    peer: SocketAddr,
    shutdown: CancellationToken,
    tracker: TaskTracker,
) {
    let id = SessionId::random();
    let (mut reader, writer) = stream.into_split();
    let handle = SessionHandle::new(id, peer, writer);

    shared.metrics.connection_established();
    shared.hooks.create(id, handle.clone());

    let span = info_span!("session", session = %id, peer = %peer);
    let end = read_loop(&shared, id, &mut reader, &shutdown, &tracker)
        .instrument(span.clone())
        .await;

    span.in_scope(|| match end {
        Ok(()) => info!("Closing connection on shutdown"),
        Err(e) if e.is_disconnect() => info!(error = %e, "Connection ended"),
        Err(e) => {
            shared.metrics.session_error();
            error!(error = %e, "Error reading from connection");
        }
    });

    if let Err(e) = handle.close().await {
        debug!(session = %id, error = %e, "Error closing connection");
    }
    drop(reader);

    shared.hooks.destroy(id);
    shared.metrics.connection_closed();
    debug!(session = %id, "Session destroyed");
}

/// `Ok` means shutdown; a peer EOF ends with [`ServerError::ConnectionClosed`].
async fn read_loop<O: Opcode>(
    shared: &Arc<Shared<O>>,
    id: SessionId,
    reader: &mut OwnedReadHalf,
    shutdown: &CancellationToken,
    tracker: &TaskTracker,
) -> Result<()> {
    let config = &shared.config;
    let mut framer = Framer::new(config.header_size, config.max_frame_length);

    loop {
        while let Some(body) = next_body(shared, &mut framer)? {
            shared.metrics.frame_received();
            let body = shared.hooks.decrypt(id, body).freeze();
            let dispatcher = Arc::clone(shared);
            tracker.spawn(async move { dispatcher.dispatch(id, body) });
        }

        let read = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(()),
            read = tokio::time::timeout(config.read_timeout, reader.read(framer.spare())) => read,
        };

        match read {
            Err(_elapsed) => {
                shared.metrics.read_timeout();
                trace!(phase = ?framer.phase(), "Read deadline elapsed, polling again");
            }
            Ok(Ok(0)) => return Err(ServerError::ConnectionClosed),
            Ok(Ok(n)) => {
                shared.metrics.bytes_read(n as u64);
                framer.advance(n);
            }
            Ok(Err(e)) => return Err(ServerError::Io(e)),
        }
    }
}

fn next_body<O: Opcode>(shared: &Shared<O>, framer: &mut Framer) -> Result<Option<bytes::BytesMut>> {
    framer.next_body(shared.frame_length.as_ref()).inspect_err(|e| {
        if let ServerError::OversizedPacket(length) = e {
            shared.metrics.oversized_frame();
            warn!(length, limit = shared.config.max_frame_length, "Frame exceeds maximum length");
        }
    })
}

/// Assembles a [`Server`] from configuration, hooks and handlers.
pub struct ServerBuilder<O: Opcode> {
    config: ServerConfig,
    hooks: SessionHooks,
    frame_length: Box<dyn FrameLength>,
    table: DispatchTable<O>,
    encoding: Arc<dyn TextEncoding>,
}

impl<O: Opcode> ServerBuilder<O> {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            hooks: SessionHooks::default(),
            frame_length: Box::new(LittleEndianLength),
            table: DispatchTable::default(),
            encoding: Arc::new(ShiftJis),
        }
    }

    /// Header-to-body-length function. Defaults to [`LittleEndianLength`].
    pub fn frame_length<F>(mut self, frame_length: F) -> Self
    where
        F: FrameLength + 'static,
    {
        self.frame_length = Box::new(frame_length);
        self
    }

    /// Replace all three lifecycle hooks at once.
    pub fn hooks(mut self, hooks: SessionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn on_create<F>(mut self, creator: F) -> Self
    where
        F: Fn(SessionId, SessionHandle) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_creator(creator);
        self
    }

    pub fn decryptor<F>(mut self, decryptor: F) -> Self
    where
        F: Fn(SessionId, bytes::BytesMut) -> bytes::BytesMut + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_decryptor(decryptor);
        self
    }

    pub fn on_destroy<F>(mut self, destroyer: F) -> Self
    where
        F: Fn(SessionId) + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_destroyer(destroyer);
        self
    }

    pub fn handlers(mut self, table: DispatchTable<O>) -> Self {
        self.table = table;
        self
    }

    /// Text encoding handed to every request reader. Defaults to Shift_JIS.
    pub fn text_encoding(mut self, encoding: Arc<dyn TextEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    /// Validate the configuration and freeze everything into a server.
    pub fn build(self) -> Result<Server<O>> {
        self.config.validate_strict()?;

        if let Some(configured) = self.config.opcode_width {
            if configured != O::WIDTH {
                return Err(ServerError::OpcodeWidthMismatch {
                    configured,
                    expected: O::WIDTH,
                });
            }
        }

        debug!(handlers = self.table.len(), width = ?O::WIDTH, "Server built");

        Ok(Server {
            shared: Arc::new(Shared {
                config: self.config,
                hooks: self.hooks,
                frame_length: self.frame_length,
                table: self.table,
                encoding: self.encoding,
                metrics: Arc::new(Metrics::new()),
            }),
        })
    }
}

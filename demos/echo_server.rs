//! Example: Echo Server
//!
//! Two-byte opcodes over the default 4-byte little-endian length header.
//!
//! - `0x0001` login: ascii string name, answered with `0x0002` and a greeting
//! - `0x0003` echo: any payload, answered with `0x0004` and the same bytes
//!
//! Configuration comes from the TOML file given as the first argument, or
//! from `OPCODE_SOCKET_*` environment variables when no file is given.
//!
//! Run with: `cargo run --example echo_server -- [config.toml]`

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use opcode_socket::config::{LoggingConfig, SocketConfig};
use opcode_socket::utils::logging::init_logging;
use opcode_socket::{DispatchTable, Opcode, PacketWriter, Server, SessionHandle, SessionId};
use tracing::{info, warn};

type Sessions = Arc<RwLock<HashMap<SessionId, SessionHandle>>>;

fn reply(sessions: &Sessions, session: SessionId, packet: PacketWriter) {
    let handle = sessions.read().ok().and_then(|map| map.get(&session).cloned());
    let Some(handle) = handle else {
        warn!(%session, "Reply to unknown session dropped");
        return;
    };
    tokio::spawn(async move {
        if let Err(e) = handle.send(packet.bytes()).await {
            warn!(%session, error = %e, "Failed to send reply");
        }
    });
}

fn framed(opcode: u16, fill: impl FnOnce(&mut PacketWriter)) -> PacketWriter {
    let mut body = PacketWriter::new();
    opcode.write_to(&mut body);
    fill(&mut body);

    let mut packet = PacketWriter::with_capacity(body.len() + 4);
    packet.write_u32(body.len() as u32);
    packet.write_bytes(body.bytes());
    packet
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => SocketConfig::from_file(path)?,
        None => SocketConfig {
            server: opcode_socket::config::ServerConfig::from_env()?,
            logging: LoggingConfig::default(),
        },
    };
    init_logging(&config.logging)?;

    let sessions: Sessions = Arc::default();

    let login = Arc::clone(&sessions);
    let echo = Arc::clone(&sessions);
    let handlers = DispatchTable::<u16>::builder()
        .register(0x0001, move |session, mut reader| {
            let name = reader.read_ascii_string();
            info!(%session, %name, "Login");
            let packet = framed(0x0002, |w| w.write_ascii_string(&format!("ようこそ, {name}")));
            reply(&login, session, packet);
        })
        .register(0x0003, move |session, reader| {
            let payload = reader.rest().to_vec();
            reply(&echo, session, framed(0x0004, |w| w.write_bytes(&payload)));
        })
        .build();

    let created = Arc::clone(&sessions);
    let destroyed = Arc::clone(&sessions);
    let server = Server::builder(config.server)
        .handlers(handlers)
        .on_create(move |id, handle| {
            info!(session = %id, peer = %handle.peer_addr(), "Session created");
            if let Ok(mut map) = created.write() {
                map.insert(id, handle);
            }
        })
        .on_destroy(move |id| {
            if let Ok(mut map) = destroyed.write() {
                map.remove(&id);
            }
        })
        .build()?;

    server.run_until_ctrl_c().await?;

    let metrics = server.metrics();
    info!(
        sessions = metrics.connections_total,
        dispatched = metrics.messages_dispatched,
        "Echo server stopped"
    );
    Ok(())
}

//! ConnectionSet: the live VISCA TCP clients.
//!
//! Each accepted socket is split in two.  The write half stays here so the
//! bridge loop can answer a client or broadcast to all of them.  The read half
//! moves into a small reader task that forwards every chunk it receives (or
//! the fact that the peer went away) into one shared event channel:
//!
//! ```text
//! client 1 ─ reader task ─┐
//! client 2 ─ reader task ─┼─► mpsc<ClientEvent> ─► bridge loop
//! client 3 ─ reader task ─┘
//! ```
//!
//! The bridge loop waits on that channel instead of polling sockets, so "which
//! clients are readable" is simply "which events are queued".
//!
//! Every mutation refreshes the active-client gauge in [`BridgeStats`], so the
//! admin API always sees the same number as [`ConnectionSet::len`].
//!
//! [`BridgeStats`]: visca_core::BridgeStats

use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;
use visca_core::{BridgeError, StatsSink};

/// Identifier assigned to each accepted client, unique for the process.
pub type ConnectionId = u64;

/// Largest chunk a reader task delivers in one event.
pub const READ_CHUNK_SIZE: usize = 1024;

/// A client that cannot take a reply within this time is dropped.
pub const CLIENT_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// What a reader task observed on its socket.
#[derive(Debug)]
pub enum ClientEvent {
    Data { id: ConnectionId, bytes: Vec<u8> },
    /// Orderly shutdown (read returned 0 bytes).
    Closed { id: ConnectionId },
    Failed { id: ConnectionId, error: io::Error },
}

/// One connected client.
pub struct ClientConnection {
    peer: SocketAddr,
    writer: OwnedWriteHalf,
    reader: JoinHandle<()>,
}

impl ClientConnection {
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    async fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        match timeout(CLIENT_WRITE_TIMEOUT, self.writer.write_all(bytes)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "client write timed out",
            )),
        }
    }

    async fn close(mut self) {
        self.reader.abort();
        if let Err(e) = self.writer.shutdown().await {
            debug!("shutdown of {} failed: {e}", self.peer);
        }
    }
}

/// The set of live clients, keyed by [`ConnectionId`].
pub struct ConnectionSet {
    clients: BTreeMap<ConnectionId, ClientConnection>,
    next_id: ConnectionId,
    events: mpsc::Sender<ClientEvent>,
    sink: Arc<StatsSink>,
}

impl ConnectionSet {
    /// Creates an empty set whose reader tasks report into `events`.
    pub fn new(sink: Arc<StatsSink>, events: mpsc::Sender<ClientEvent>) -> Self {
        sink.stats.set_active_clients(0);
        Self {
            clients: BTreeMap::new(),
            next_id: 1,
            events,
            sink,
        }
    }

    /// Registers an accepted stream and starts its reader task.
    pub fn accept(&mut self, stream: TcpStream, peer: SocketAddr) -> ConnectionId {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay for {peer} failed: {e}");
        }
        let (read_half, writer) = stream.into_split();

        let id = self.next_id;
        self.next_id += 1;

        let reader = tokio::spawn(read_client(id, read_half, self.events.clone()));
        self.clients.insert(
            id,
            ClientConnection {
                peer,
                writer,
                reader,
            },
        );

        self.sink.stats.record_connection();
        self.refresh_gauge();
        self.sink.info(format!("Client: {}", peer.ip()));
        id
    }

    /// Closes and forgets a client.  Returns `false` if it was already gone.
    pub async fn remove(&mut self, id: ConnectionId) -> bool {
        let Some(client) = self.clients.remove(&id) else {
            return false;
        };
        let peer = client.peer();
        client.close().await;
        self.refresh_gauge();
        self.sink.info(format!("Client disconnected: {}", peer.ip()));
        true
    }

    /// Writes `bytes` to one client.
    ///
    /// # Errors
    ///
    /// [`BridgeError::ClientDisconnected`] if the client is unknown or the
    /// write fails; in the latter case the client is removed first.
    pub async fn send_to(&mut self, id: ConnectionId, bytes: &[u8]) -> Result<(), BridgeError> {
        let Some(client) = self.clients.get_mut(&id) else {
            return Err(BridgeError::ClientDisconnected(id));
        };
        if let Err(e) = client.send(bytes).await {
            debug!("write to client {id} failed: {e}");
            self.remove(id).await;
            return Err(BridgeError::ClientDisconnected(id));
        }
        Ok(())
    }

    /// Writes `bytes` to every client; clients whose write fails are removed.
    ///
    /// Returns how many clients received the bytes.
    pub async fn broadcast(&mut self, bytes: &[u8]) -> usize {
        let mut failed = Vec::new();
        let mut delivered = 0;
        for (id, client) in self.clients.iter_mut() {
            match client.send(bytes).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    debug!("broadcast to client {id} failed: {e}");
                    failed.push(*id);
                }
            }
        }
        for id in failed {
            self.remove(id).await;
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Closes every client; used on shutdown.
    pub async fn close_all(&mut self) {
        let clients = std::mem::take(&mut self.clients);
        for (_, client) in clients {
            client.close().await;
        }
        self.refresh_gauge();
    }

    fn refresh_gauge(&self) {
        self.sink.stats.set_active_clients(self.clients.len());
    }
}

async fn read_client(id: ConnectionId, mut socket: OwnedReadHalf, events: mpsc::Sender<ClientEvent>) {
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let event = match socket.read(&mut buf).await {
            Ok(0) => ClientEvent::Closed { id },
            Ok(n) => ClientEvent::Data {
                id,
                bytes: buf[..n].to_vec(),
            },
            Err(error) => ClientEvent::Failed { id, error },
        };
        let done = !matches!(event, ClientEvent::Data { .. });
        if events.send(event).await.is_err() || done {
            break;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

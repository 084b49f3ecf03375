//! Bridge server: the VISCA TCP listener and the loop that schedules it.
//!
//! # One iteration of the loop (for beginners)
//!
//! ```text
//!            ┌──────────── select! ─────────────┐
//!            │ listener.accept()   → new client │
//!            │ client event queued → client turn│
//!            │ 20 ms tick          → (nothing)  │
//!            └──────────────────────────────────┘
//!                           │
//!                           ▼
//!           drain serial, broadcast unsolicited bytes
//! ```
//!
//! A *client turn* is the heart of the bridge: the bytes a client sent are
//! written to the camera, the loop waits (bounded) for the reply frame, and
//! that frame goes back to the same client only.  While one turn waits for
//! the camera, other clients wait too.  Serial VISCA can only carry one
//! command at a time, so this head-of-line blocking matches the hardware.
//!
//! The tick guarantees the loop wakes up often enough to forward
//! notifications from the camera even when no client is talking.
//!
//! Nothing a single client does can stop the loop.  It only ends when the
//! shared `running` flag is cleared (Ctrl+C or SIGTERM), at which point every client
//! socket is closed and the listener is dropped.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::debug;
use visca_core::{BridgeError, StatsSink};

use crate::application::serial_link::SerialLink;
use crate::infrastructure::connection_set::{ClientEvent, ConnectionId, ConnectionSet};

/// Upper bound on how long the loop sleeps between two serial drains.
pub const WAIT_TICK: Duration = Duration::from_millis(20);

const EVENT_QUEUE_DEPTH: usize = 256;

/// A bound VISCA TCP listener, ready to run.
pub struct BridgeServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl BridgeServer {
    /// Binds the VISCA listener.
    ///
    /// # Errors
    ///
    /// [`BridgeError::ListenerBindFailure`] if the address is in use or not
    /// available.  Callers treat this as fatal.
    pub async fn bind(addr: SocketAddr) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| BridgeError::ListenerBindFailure { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BridgeError::ListenerBindFailure { addr, source })?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// The bound address; useful when binding to port 0 in tests.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs the bridge loop until `running` becomes `false`.
    pub async fn run(
        self,
        link: Arc<dyn SerialLink>,
        sink: Arc<StatsSink>,
        response_timeout: Duration,
        running: Arc<AtomicBool>,
    ) {
        let (event_tx, mut events) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let mut bridge = BridgeLoop {
            connections: ConnectionSet::new(Arc::clone(&sink), event_tx),
            link,
            sink,
            response_timeout,
        };

        let mut tick = interval(WAIT_TICK);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        bridge.sink.info(format!("VISCA: {}", self.local_addr));

        while running.load(Ordering::SeqCst) {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        bridge.connections.accept(stream, peer);
                    }
                    Err(e) => {
                        bridge.sink.warn(format!("Accept failed: {e}"));
                        // Errors like EMFILE repeat until a socket frees up.
                        sleep(WAIT_TICK).await;
                    }
                },
                Some(event) = events.recv() => {
                    bridge.handle(event).await;
                    while let Ok(event) = events.try_recv() {
                        bridge.handle(event).await;
                    }
                }
                _ = tick.tick() => {}
            }

            bridge.forward_unsolicited().await;
        }

        bridge.connections.close_all().await;
        bridge.sink.info("VISCA loop stopped");
    }
}

/// State owned by the running loop.
struct BridgeLoop {
    connections: ConnectionSet,
    link: Arc<dyn SerialLink>,
    sink: Arc<StatsSink>,
    response_timeout: Duration,
}

impl BridgeLoop {
    async fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Data { id, bytes } => {
                // Already dropped (e.g. a failed reply); its queued data is stale.
                if !self.connections.contains(id) {
                    return;
                }
                self.client_turn(id, bytes).await;
            }
            ClientEvent::Closed { id } => {
                self.connections.remove(id).await;
            }
            ClientEvent::Failed { id, error } => {
                self.sink.warn(format!("Client {id} read failed: {error}"));
                self.connections.remove(id).await;
            }
        }
    }

    async fn client_turn(&mut self, id: ConnectionId, request: Vec<u8>) {
        let reply = match self.link.exchange(request, self.response_timeout).await {
            Ok(Some(reply)) => reply,
            Ok(None) => return,
            Err(e) => {
                self.sink.warn(format!("Serial: {e}"));
                return;
            }
        };

        if let Err(e) = self.connections.send_to(id, &reply).await {
            debug!("reply dropped: {e}");
        }
    }

    async fn forward_unsolicited(&mut self) {
        match self.link.drain().await {
            Ok(Some(bytes)) => {
                let delivered = self.connections.broadcast(&bytes).await;
                debug!("unsolicited {} bytes to {delivered} clients", bytes.len());
            }
            Ok(None) => {}
            Err(e) => debug!("serial drain skipped: {e}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

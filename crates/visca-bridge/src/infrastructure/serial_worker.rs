//! Serial worker: a dedicated thread that owns the [`SerialTransport`].
//!
//! # Why a thread (for beginners)
//!
//! Serial reads in this bridge poll and sleep, so they block the calling
//! thread for up to the response timeout.  Running that inside a tokio task
//! would stall every other task scheduled on the same worker thread.  Instead
//! one plain OS thread owns the transport and executes requests one at a time
//! from a queue:
//!
//! ```text
//! bridge loop ─┐                      ┌──────────────────────┐
//!              ├─ mpsc ─────────────► │ serial-worker thread │ ── /dev/serial0
//! admin API  ──┘  (Exchange / Drain)  │   owns SerialTransport│
//!                 ◄── oneshot reply ──└──────────────────────┘
//! ```
//!
//! Because requests are executed strictly in order, one write-then-read cycle
//! always finishes before the next starts.  That is the whole mutual
//! exclusion story: nothing else can reach the transport.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use visca_core::BridgeError;

use crate::application::serial_link::SerialLink;
use crate::infrastructure::serial::SerialTransport;

/// Requests that can wait in the worker's queue.
const QUEUE_DEPTH: usize = 64;

type Reply = oneshot::Sender<Result<Option<Vec<u8>>, BridgeError>>;

enum SerialRequest {
    Exchange {
        request: Vec<u8>,
        wait: Duration,
        reply: Reply,
    },
    Drain {
        reply: Reply,
    },
    Close,
}

/// Cheap, cloneable access to the serial worker.
///
/// A call waits as long as it takes the worker to reach it: queued requests
/// are served in order, each one bounded only by its own `wait`.
#[derive(Clone)]
pub struct SerialHandle {
    tx: mpsc::Sender<SerialRequest>,
}

impl SerialHandle {
    async fn call(
        &self,
        make: impl FnOnce(Reply) -> SerialRequest,
    ) -> Result<Option<Vec<u8>>, BridgeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| BridgeError::LinkClosed)?;
        reply_rx.await.map_err(|_| BridgeError::LinkClosed)?
    }
}

#[async_trait]
impl SerialLink for SerialHandle {
    async fn exchange(
        &self,
        request: Vec<u8>,
        wait: Duration,
    ) -> Result<Option<Vec<u8>>, BridgeError> {
        self.call(|reply| SerialRequest::Exchange {
            request,
            wait,
            reply,
        })
        .await
    }

    async fn drain(&self) -> Result<Option<Vec<u8>>, BridgeError> {
        self.call(|reply| SerialRequest::Drain { reply }).await
    }
}

/// Owner of the worker thread.  Dropping it without [`SerialWorker::shutdown`]
/// leaves the thread running until every [`SerialHandle`] is gone.
pub struct SerialWorker {
    handle: SerialHandle,
    thread: Option<JoinHandle<()>>,
}

impl SerialWorker {
    /// Moves `transport` onto a new thread named `serial-worker`.
    pub fn spawn(transport: SerialTransport) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let thread = thread::Builder::new()
            .name("serial-worker".to_string())
            .spawn(move || run_worker(transport, rx))?;

        Ok(Self {
            handle: SerialHandle { tx },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> SerialHandle {
        self.handle.clone()
    }

    /// Finishes the request in progress, closes the device and joins the
    /// thread.  Requests still queued behind the close fail with
    /// `LinkClosed`.
    pub async fn shutdown(mut self) {
        if self.handle.tx.send(SerialRequest::Close).await.is_err() {
            debug!("serial worker already stopped");
        }
        if let Some(thread) = self.thread.take() {
            match tokio::task::spawn_blocking(move || thread.join()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => warn!("serial worker panicked"),
                Err(e) => warn!("could not join serial worker: {e}"),
            }
        }
    }
}

fn run_worker(mut transport: SerialTransport, mut rx: mpsc::Receiver<SerialRequest>) {
    while let Some(request) = rx.blocking_recv() {
        match request {
            SerialRequest::Exchange {
                request,
                wait,
                reply,
            } => {
                // A caller that went away still gets its command written; the
                // reply then goes out with the unsolicited bytes.
                if let Err(Ok(Some(orphan))) = reply.send(transport.exchange(&request, wait)) {
                    debug!("caller gone, carrying {} reply bytes", orphan.len());
                    transport.carry_over(&orphan);
                }
            }
            SerialRequest::Drain { reply } => {
                if let Err(Ok(Some(orphan))) = reply.send(transport.drain_non_blocking()) {
                    transport.carry_over(&orphan);
                }
            }
            SerialRequest::Close => break,
        }
    }
    drop(transport);
    info!("serial device closed");
}

//! Error taxonomy shared by every layer of the bridge.
//!
//! The variants split into two groups:
//!
//! - **Startup errors** (`TransportUnavailable`, `ListenerBindFailure`) abort
//!   the process before the bridge loop starts.  There is no partial-startup
//!   state to clean up.
//! - **Steady-state errors** (everything else) are contained: they are logged
//!   and reported only to the affected caller, never to the bridge loop.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors produced by the serial transport, the connection set and command
/// submission.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The serial device could not be opened (missing device, permissions,
    /// wrong path).  Fatal at startup.
    #[error("serial device {path} unavailable: {reason}")]
    TransportUnavailable { path: String, reason: String },

    /// The serial device did not accept a write within the write timeout.
    #[error("serial write timed out")]
    WriteTimeout,

    /// The serial worker did not answer within the bounded wait.
    #[error("serial response wait timed out")]
    ReadTimeout,

    /// Any other serial I/O failure during steady-state operation.
    #[error("serial I/O error: {0}")]
    TransportIo(String),

    /// The serial worker has shut down; no more requests are accepted.
    #[error("serial link closed")]
    LinkClosed,

    /// The TCP client went away (orderly close or failed send).
    #[error("client {0} disconnected")]
    ClientDisconnected(u64),

    /// A submitted command was not valid hex.  The transport is untouched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A listening socket could not be bound.  Fatal at startup.
    #[error("failed to bind listener on {addr}: {source}")]
    ListenerBindFailure {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

impl BridgeError {
    /// Returns the short, stable name of the variant.
    ///
    /// The admin API reports this name in its `err` field so that frontends can
    /// match on it without parsing the human-readable message.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::TransportUnavailable { .. } => "TransportUnavailable",
            BridgeError::WriteTimeout => "WriteTimeout",
            BridgeError::ReadTimeout => "ReadTimeout",
            BridgeError::TransportIo(_) => "TransportIo",
            BridgeError::LinkClosed => "LinkClosed",
            BridgeError::ClientDisconnected(_) => "ClientDisconnected",
            BridgeError::InvalidInput(_) => "InvalidInput",
            BridgeError::ListenerBindFailure { .. } => "ListenerBindFailure",
        }
    }
}

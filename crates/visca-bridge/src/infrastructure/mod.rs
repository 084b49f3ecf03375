//! Infrastructure layer for visca-bridge.
//!
//! Contains the OS-facing adapters: the serial device and its worker thread,
//! the VISCA TCP listener with its client set, the admin HTTP server, and the
//! files read at startup.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `visca_core`, but MUST NOT be imported by the `application` or `domain`
//! layers.

pub mod admin_api;
pub mod assets;
pub mod bridge_server;
pub mod connection_set;
pub mod serial;
pub mod serial_worker;

pub use admin_api::{AdminServer, AdminState};
pub use bridge_server::BridgeServer;
pub use connection_set::{ConnectionId, ConnectionSet};
pub use serial::SerialTransport;
pub use serial_worker::{SerialHandle, SerialWorker};

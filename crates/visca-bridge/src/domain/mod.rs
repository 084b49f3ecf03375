//! Domain layer for visca-bridge.
//!
//! Pure types with no I/O: the runtime configuration and the JSON shapes
//! exchanged with the admin UI.
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream` or serial port types
//! - File I/O or environment variable reading
//! - Anything that could block or fail due to external state

pub mod config;
pub mod messages;

pub use config::{BridgeConfig, SerialConfig};
pub use messages::{CommandRequest, CommandResponse, LogEntryJson, StatsResponse};

//! # visca-core
//!
//! Shared library for the VISCA-over-IP bridge containing frame boundary
//! detection, the hex command codec, bridge statistics, the bounded event log
//! and the preset command table.
//!
//! This crate has zero dependencies on sockets, serial devices or async
//! runtimes.  Everything here can be unit tested without hardware.
//!
//! # Architecture overview (for beginners)
//!
//! VISCA is the byte protocol spoken by most pan-tilt-zoom cameras over RS-232
//! or RS-422.  A camera has exactly one serial port, but many controllers on a
//! network may want to drive it.  The bridge (`visca-bridge`) owns the serial
//! port and lets TCP clients share it.  This crate is the shared foundation:
//!
//! - **`frame`** – Where one VISCA message ends.  Every message is terminated
//!   by the byte `0xFF`; the bridge does not interpret anything else.
//!
//! - **`codec`** – Conversion between human-typed hex strings such as
//!   `"81 01 04 07 02 FF"` and raw bytes.
//!
//! - **`stats`**, **`event_log`**, **`sink`** – Counters and a fixed-size
//!   ring buffer of recent events, shared between the bridge loop and the
//!   admin API.
//!
//! - **`presets`** – The named command table shown by the admin UI.
//!
//! - **`error`** – The error taxonomy shared by every layer of the bridge.

pub mod codec;
pub mod error;
pub mod event_log;
pub mod frame;
pub mod presets;
pub mod sink;
pub mod stats;

// Re-export the most-used types at the crate root so callers can write
// `visca_core::BridgeError` instead of `visca_core::error::BridgeError`.
pub use codec::{encode_hex, parse_hex_command};
pub use error::BridgeError;
pub use event_log::{EventLog, LogEntry, Severity};
pub use frame::{FrameAssembler, FRAME_TERMINATOR};
pub use presets::PresetTable;
pub use sink::StatsSink;
pub use stats::{BridgeStats, Direction, StatsSnapshot};

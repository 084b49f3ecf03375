//! visca-bridge library crate.
//!
//! This crate shares one serial VISCA camera link between many TCP clients and
//! exposes a small HTTP admin API.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! TCP clients (raw VISCA bytes)          Admin UI (JSON over HTTP)
//!         ↕                                       ↕
//! [visca-bridge]
//!   ├── domain/           Pure types: BridgeConfig, admin JSON DTOs
//!   ├── application/      Command submission, status assembly, SerialLink seam
//!   └── infrastructure/
//!         ├── serial/         Serial transport (serialport) + test double
//!         ├── serial_worker   Single owner of the transport; serialises access
//!         ├── connection_set  Registered TCP clients, broadcast
//!         ├── bridge_server   The bridge loop
//!         ├── admin_api       axum router
//!         └── assets          Preset overrides and UI page, read at startup
//!         ↕
//! Camera (RS-232/RS-422, 8-N-1)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies beyond `serde`.
//! - `application` depends on `domain` and `visca-core`, and reaches the serial
//!   link only through the [`application::SerialLink`] trait.
//! - `infrastructure` depends on all other layers plus `tokio`, `serialport`
//!   and `axum`.

/// Domain layer: configuration and admin API message types (no I/O).
pub mod domain;

/// Application layer: command submission and status reporting.
pub mod application;

/// Infrastructure layer: serial port, TCP bridge loop, admin HTTP server.
pub mod infrastructure;

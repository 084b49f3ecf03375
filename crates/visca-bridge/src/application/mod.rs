//! Application layer for visca-bridge.
//!
//! The application layer knows *what* the bridge does for the admin API
//! (submit a command, report status) but delegates *how* bytes reach the
//! camera to the infrastructure layer through the [`SerialLink`] trait.
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or the serial device (that is infrastructure)
//! - HTTP routing (handled by `infrastructure::admin_api`)

pub mod serial_link;
pub mod status;
pub mod submit_command;

pub use serial_link::SerialLink;
pub use status::{build_status, STATUS_LOG_LIMIT};
pub use submit_command::CommandService;

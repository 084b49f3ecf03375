//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It is built once in `main.rs` from CLI arguments (or environment variables)
//! and never changes while the process runs.
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! reads inside the domain) makes the bridge easy to start from tests with
//! ephemeral ports and a mock serial device.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the serial device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/serial0` or `/dev/ttyUSB0` (`COM3` on Windows).
    pub path: String,

    /// Line speed.  VISCA cameras default to 9600; many accept 38400.
    pub baud_rate: u32,

    /// Per-call read/write timeout of the device handle.
    ///
    /// A write that cannot complete within this time fails with
    /// `WriteTimeout`.
    pub io_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "/dev/serial0".to_string(),
            baud_rate: 9600,
            io_timeout: Duration::from_millis(100),
        }
    }
}

/// All runtime configuration for the bridge.
///
/// # Example
///
/// ```rust
/// use visca_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.bridge_addr.port(), 52381);
/// assert_eq!(cfg.admin_addr.port(), 8080);
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address the VISCA TCP listener binds to.
    ///
    /// 52381 is the port Sony uses for VISCA over IP, so most controllers
    /// try it first.
    pub bridge_addr: SocketAddr,

    /// Address the admin HTTP server binds to.
    pub admin_addr: SocketAddr,

    pub serial: SerialConfig,

    /// How long a client's command waits for the camera's reply before the
    /// bridge gives up and serves the next command.
    pub response_timeout: Duration,

    /// Maximum number of entries kept in the event ring buffer.
    pub log_capacity: usize,

    /// Optional TOML file overriding or extending the preset command table.
    pub presets_file: Option<PathBuf>,

    /// Optional admin UI `index.html`, served at `/`.
    pub ui_index: Option<PathBuf>,
}

impl Default for BridgeConfig {
    /// | Field            | Default          |
    /// |------------------|------------------|
    /// | bridge_addr      | `0.0.0.0:52381`  |
    /// | admin_addr       | `0.0.0.0:8080`   |
    /// | serial.path      | `/dev/serial0`   |
    /// | serial.baud_rate | 9600             |
    /// | serial.io_timeout| 100 ms           |
    /// | response_timeout | 100 ms           |
    /// | log_capacity     | 50               |
    fn default() -> Self {
        Self {
            bridge_addr: SocketAddr::from(([0, 0, 0, 0], 52381)),
            admin_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            serial: SerialConfig::default(),
            response_timeout: Duration::from_millis(100),
            log_capacity: 50,
            presets_file: None,
            ui_index: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

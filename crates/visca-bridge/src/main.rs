//! VISCA-over-IP bridge: entry point.
//!
//! Owns the serial port of a PTZ camera and shares it with any number of TCP
//! clients (camera controllers, vMix, OBS plugins, ...).  A small HTTP admin
//! API shows link statistics and lets an operator send commands by hand.
//!
//! # Usage
//!
//! ```text
//! visca-bridge [OPTIONS]
//!
//! Options:
//!   --bind <IP>                 VISCA listener address     [default: 0.0.0.0]
//!   --port <PORT>               VISCA listener port        [default: 52381]
//!   --admin-bind <IP>           Admin HTTP address         [default: 0.0.0.0]
//!   --admin-port <PORT>         Admin HTTP port            [default: 8080]
//!   --serial-port <PATH>        Serial device              [default: /dev/serial0]
//!   --baud <RATE>               Line speed                 [default: 9600]
//!   --serial-timeout-ms <MS>    Device read/write timeout  [default: 100]
//!   --response-timeout-ms <MS>  Wait for a camera reply    [default: 100]
//!   --log-capacity <N>          Events kept for the UI     [default: 50]
//!   --presets <FILE>            TOML preset overrides
//!   --ui-index <FILE>           Admin UI page served at /
//! ```
//!
//! Every option can also be set through the environment variable shown in
//! `--help` (`VISCA_PORT`, `VISCA_SERIAL_PORT`, ...).  CLI args take
//! precedence when both are present.
//!
//! # Startup order
//!
//! Presets, serial device, VISCA listener, admin listener.  Any failure here
//! ends the process with a non-zero exit code before a single client is
//! accepted.  Once running, only Ctrl+C or SIGTERM (`systemctl stop`) stops
//! the bridge, and both take the same orderly path.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use visca_bridge::application::{CommandService, SerialLink};
use visca_bridge::domain::{BridgeConfig, SerialConfig};
use visca_bridge::infrastructure::assets::{load_index_html, load_presets};
use visca_bridge::infrastructure::{
    AdminServer, AdminState, BridgeServer, SerialTransport, SerialWorker,
};
use visca_core::StatsSink;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Longest accepted serial or response timeout.
const MAX_TIMEOUT_MS: u64 = 60_000;

/// VISCA-over-IP bridge.
///
/// Shares one serial VISCA camera link between many TCP clients.
#[derive(Debug, Parser)]
#[command(
    name = "visca-bridge",
    about = "Share one serial VISCA camera link between many TCP clients",
    version
)]
struct Cli {
    /// IP address the VISCA TCP listener binds to.
    #[arg(long, default_value = "0.0.0.0", env = "VISCA_BIND")]
    bind: String,

    /// VISCA TCP port.  52381 is the usual VISCA-over-IP port.
    #[arg(long, default_value_t = 52381, env = "VISCA_PORT")]
    port: u16,

    /// IP address the admin HTTP server binds to.
    ///
    /// Use `127.0.0.1` to keep the admin page off the network.
    #[arg(long, default_value = "0.0.0.0", env = "VISCA_ADMIN_BIND")]
    admin_bind: String,

    /// Admin HTTP port.
    #[arg(long, default_value_t = 8080, env = "VISCA_ADMIN_PORT")]
    admin_port: u16,

    /// Serial device the camera is attached to.
    #[arg(long, default_value = "/dev/serial0", env = "VISCA_SERIAL_PORT")]
    serial_port: String,

    /// Serial line speed.
    #[arg(long, default_value_t = 9600, env = "VISCA_BAUD")]
    baud: u32,

    /// Read/write timeout of the serial device, in milliseconds.
    #[arg(long, default_value_t = 100, env = "VISCA_SERIAL_TIMEOUT_MS")]
    serial_timeout_ms: u64,

    /// How long to wait for the camera's reply to a command, in milliseconds.
    #[arg(long, default_value_t = 100, env = "VISCA_RESPONSE_TIMEOUT_MS")]
    response_timeout_ms: u64,

    /// Number of events kept for the admin UI (at least 1).
    #[arg(long, default_value_t = 50, env = "VISCA_LOG_CAPACITY")]
    log_capacity: usize,

    /// TOML file whose `[presets]` table overrides or extends the built-in
    /// preset commands.
    #[arg(long, env = "VISCA_PRESETS")]
    presets: Option<PathBuf>,

    /// HTML file served as the admin UI at `/`.
    #[arg(long, env = "VISCA_UI_INDEX")]
    ui_index: Option<PathBuf>,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if a bind address is not an IP address, a timeout is
    /// above [`MAX_TIMEOUT_MS`], or `--log-capacity` is 0.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        let bind: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid VISCA bind address: '{}'", self.bind))?;
        let admin_bind: IpAddr = self
            .admin_bind
            .parse()
            .with_context(|| format!("invalid admin bind address: '{}'", self.admin_bind))?;
        anyhow::ensure!(self.log_capacity >= 1, "--log-capacity must be at least 1");
        anyhow::ensure!(
            self.serial_timeout_ms <= MAX_TIMEOUT_MS,
            "--serial-timeout-ms must be at most {MAX_TIMEOUT_MS}"
        );
        anyhow::ensure!(
            self.response_timeout_ms <= MAX_TIMEOUT_MS,
            "--response-timeout-ms must be at most {MAX_TIMEOUT_MS}"
        );

        Ok(BridgeConfig {
            bridge_addr: SocketAddr::new(bind, self.port),
            admin_addr: SocketAddr::new(admin_bind, self.admin_port),
            serial: SerialConfig {
                path: self.serial_port,
                baud_rate: self.baud,
                io_timeout: Duration::from_millis(self.serial_timeout_ms),
            },
            response_timeout: Duration::from_millis(self.response_timeout_ms),
            log_capacity: self.log_capacity,
            presets_file: self.presets,
            ui_index: self.ui_index,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Level is overridden by `RUST_LOG`, e.g. `RUST_LOG=visca_bridge=debug`
    // to see every byte on the wire.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_bridge_config()?;
    let sink = Arc::new(StatsSink::new(config.log_capacity));

    // ── Startup (every step is fatal) ─────────────────────────────────────────
    let presets = load_presets(config.presets_file.as_deref()).context("loading presets")?;
    let index_html = load_index_html(config.ui_index.as_deref(), &sink);

    let transport = SerialTransport::open(&config.serial, Arc::clone(&sink))
        .context("opening serial device")?;
    let bridge = BridgeServer::bind(config.bridge_addr)
        .await
        .context("binding VISCA listener")?;
    let admin = AdminServer::bind(config.admin_addr)
        .await
        .context("binding admin listener")?;

    let worker = SerialWorker::spawn(transport).context("starting serial worker")?;
    let link: Arc<dyn SerialLink> = Arc::new(worker.handle());

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(signal) => {
                info!("received {signal}, shutting down");
                running_clone.store(false, Ordering::SeqCst);
            }
            Err(e) => error!("failed to listen for shutdown signals: {e}"),
        }
    });

    // ── Admin API ─────────────────────────────────────────────────────────────
    let commands = CommandService::new(
        Arc::clone(&link),
        Arc::clone(&sink),
        config.response_timeout,
    );
    let response_timeout = config.response_timeout;
    let admin_state = AdminState {
        commands: Arc::new(commands),
        sink: Arc::clone(&sink),
        presets: Arc::new(presets),
        config: Arc::new(config),
        running: Arc::clone(&running),
        index_html: Arc::from(index_html),
    };
    let admin_task = tokio::spawn(admin.run(admin_state));

    // ── Bridge loop ───────────────────────────────────────────────────────────
    bridge
        .run(link, Arc::clone(&sink), response_timeout, Arc::clone(&running))
        .await;

    worker.shutdown().await;
    match admin_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("admin server failed: {e}"),
        Err(e) => error!("admin task panicked: {e}"),
    }

    info!("VISCA bridge stopped");
    Ok(())
}

/// Resolves with the name of the first shutdown signal received.
#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "Ctrl+C"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "Ctrl+C")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_match_bridge_config_defaults() {
        // Arrange: parse with no arguments (all defaults apply)
        let cli = Cli::parse_from(["visca-bridge"]);

        // Act
        let config = cli.into_bridge_config().unwrap();

        // Assert
        let defaults = BridgeConfig::default();
        assert_eq!(config.bridge_addr, defaults.bridge_addr);
        assert_eq!(config.admin_addr, defaults.admin_addr);
        assert_eq!(config.serial, defaults.serial);
        assert_eq!(config.response_timeout, defaults.response_timeout);
        assert_eq!(config.log_capacity, defaults.log_capacity);
        assert!(config.presets_file.is_none());
        assert!(config.ui_index.is_none());
    }

    #[test]
    fn test_cli_port_override() {
        let cli = Cli::parse_from(["visca-bridge", "--port", "1259"]);
        let config = cli.into_bridge_config().unwrap();
        assert_eq!(config.bridge_addr.port(), 1259);
    }

    #[test]
    fn test_cli_serial_overrides() {
        let cli = Cli::parse_from([
            "visca-bridge",
            "--serial-port",
            "/dev/ttyUSB0",
            "--baud",
            "38400",
            "--serial-timeout-ms",
            "250",
        ]);

        let config = cli.into_bridge_config().unwrap();

        assert_eq!(config.serial.path, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 38400);
        assert_eq!(config.serial.io_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_cli_admin_address_override() {
        let cli = Cli::parse_from([
            "visca-bridge",
            "--admin-bind",
            "127.0.0.1",
            "--admin-port",
            "9090",
        ]);
        let config = cli.into_bridge_config().unwrap();
        assert_eq!(config.admin_addr.to_string(), "127.0.0.1:9090");
    }

    #[test]
    fn test_cli_response_timeout_and_files() {
        let cli = Cli::parse_from([
            "visca-bridge",
            "--response-timeout-ms",
            "300",
            "--presets",
            "/etc/visca/presets.toml",
            "--ui-index",
            "/usr/share/visca/index.html",
        ]);

        let config = cli.into_bridge_config().unwrap();

        assert_eq!(config.response_timeout, Duration::from_millis(300));
        assert_eq!(
            config.presets_file.as_deref(),
            Some(std::path::Path::new("/etc/visca/presets.toml"))
        );
        assert!(config.ui_index.is_some());
    }

    #[test]
    fn test_invalid_bind_address_returns_error() {
        let cli = Cli::parse_from(["visca-bridge", "--bind", "not.an.ip"]);
        assert!(cli.into_bridge_config().is_err());
    }

    #[test]
    fn test_oversized_timeouts_return_error() {
        let serial = Cli::parse_from(["visca-bridge", "--serial-timeout-ms", "18446744073709551615"]);
        let response = Cli::parse_from(["visca-bridge", "--response-timeout-ms", "60001"]);

        assert!(serial.into_bridge_config().is_err());
        assert!(response.into_bridge_config().is_err());
    }

    #[test]
    fn test_largest_timeout_is_accepted() {
        let cli = Cli::parse_from(["visca-bridge", "--response-timeout-ms", "60000"]);
        let config = cli.into_bridge_config().unwrap();
        assert_eq!(config.response_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_zero_log_capacity_returns_error() {
        let cli = Cli::parse_from(["visca-bridge", "--log-capacity", "0"]);
        assert!(cli.into_bridge_config().is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_resolves_shutdown_signal() {
        // Arrange: let the handler register before the signal is sent.
        let waiting = tokio::spawn(shutdown_signal());
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Act
        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();

        // Assert
        assert!(status.success());
        let signal = tokio::time::timeout(Duration::from_secs(2), waiting)
            .await
            .expect("SIGTERM not observed")
            .unwrap()
            .unwrap();
        assert_eq!(signal, "SIGTERM");
    }
}

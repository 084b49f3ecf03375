//! Assembles the admin API's status document from shared state.

use visca_core::StatsSink;

use crate::domain::config::BridgeConfig;
use crate::domain::messages::{LogEntryJson, StatsResponse};

/// Number of log entries included in a status response.
pub const STATUS_LOG_LIMIT: usize = 20;

/// Builds the `GET /api/stats` body.
///
/// `now` is passed in (unix seconds) so uptime is testable without a clock.
pub fn build_status(
    sink: &StatsSink,
    config: &BridgeConfig,
    running: bool,
    now: u64,
) -> StatsResponse {
    let snap = sink.stats.snapshot();
    let log = sink
        .log
        .recent(STATUS_LOG_LIMIT)
        .iter()
        .map(LogEntryJson::from)
        .collect();

    StatsResponse {
        run: running,
        ser: snap.serial_open,
        cli: snap.active_clients,
        tot: snap.total_connections,
        i2r: snap.ip_to_serial_messages,
        r2i: snap.serial_to_ip_messages,
        act: snap.last_activity,
        start: snap.start_time,
        port: config.serial.path.clone(),
        baud: config.serial.baud_rate,
        vport: config.bridge_addr.port(),
        log,
        up: snap.uptime_secs(now),
        i2r_bytes: snap.ip_to_serial_bytes,
        r2i_bytes: snap.serial_to_ip_bytes,
        aport: config.admin_addr.port(),
        rto: config.response_timeout.as_millis() as u64,
    }
}

//! The stats/log sink shared by every bridge component.
//!
//! [`StatsSink`] bundles the counters and the event ring buffer behind one
//! `Arc`.  Its logging helpers write each event twice: once to `tracing` (the
//! console) and once to the ring buffer that the admin API serves.

use tracing::{error, info, warn};

use crate::event_log::{EventLog, Severity};
use crate::stats::BridgeStats;

/// Counters plus bounded event history.
#[derive(Debug)]
pub struct StatsSink {
    pub stats: BridgeStats,
    pub log: EventLog,
}

impl StatsSink {
    /// Creates a sink whose event log holds at most `log_capacity` entries.
    pub fn new(log_capacity: usize) -> Self {
        Self {
            stats: BridgeStats::new(),
            log: EventLog::new(log_capacity),
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.log.record(Severity::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.log.record(Severity::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.log.record(Severity::Error, message);
    }
}

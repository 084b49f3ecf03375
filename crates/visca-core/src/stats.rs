//! Lock-free bridge counters.
//!
//! [`BridgeStats`] is written by the bridge loop, the serial worker and the
//! command submission path, and read by the admin API.  Every field is an
//! atomic so readers never block writers.  `Ordering::Relaxed` is enough: the
//! counters are independent and only ever displayed, never used to
//! synchronise other memory.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Direction of a forwarded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// TCP client (or command submission) → serial device.
    IpToSerial,
    /// Serial device → TCP client(s).
    SerialToIp,
}

/// Shared counters describing bridge activity.
#[derive(Debug)]
pub struct BridgeStats {
    start_time: u64,
    active_clients: AtomicU64,
    total_connections: AtomicU64,
    ip_to_serial_messages: AtomicU64,
    ip_to_serial_bytes: AtomicU64,
    serial_to_ip_messages: AtomicU64,
    serial_to_ip_bytes: AtomicU64,
    last_activity: AtomicU64,
    serial_open: AtomicBool,
}

/// A point-in-time copy of [`BridgeStats`], suitable for serialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub start_time: u64,
    pub active_clients: u64,
    pub total_connections: u64,
    pub ip_to_serial_messages: u64,
    pub ip_to_serial_bytes: u64,
    pub serial_to_ip_messages: u64,
    pub serial_to_ip_bytes: u64,
    pub last_activity: u64,
    pub serial_open: bool,
}

impl StatsSnapshot {
    /// Seconds elapsed between `start_time` and `now`.
    pub fn uptime_secs(&self, now: u64) -> u64 {
        now.saturating_sub(self.start_time)
    }
}

impl BridgeStats {
    /// Creates zeroed counters stamped with the current time as the start time.
    pub fn new() -> Self {
        Self {
            start_time: unix_timestamp(),
            active_clients: AtomicU64::new(0),
            total_connections: AtomicU64::new(0),
            ip_to_serial_messages: AtomicU64::new(0),
            ip_to_serial_bytes: AtomicU64::new(0),
            serial_to_ip_messages: AtomicU64::new(0),
            serial_to_ip_bytes: AtomicU64::new(0),
            last_activity: AtomicU64::new(0),
            serial_open: AtomicBool::new(false),
        }
    }

    /// Counts one newly accepted TCP connection.
    pub fn record_connection(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Sets the number of currently registered clients.
    ///
    /// The connection set stores its own length here after every mutation, so
    /// the value can never drift from the real set size.
    pub fn set_active_clients(&self, count: usize) {
        self.active_clients.store(count as u64, Ordering::Relaxed);
    }

    /// Counts one message of `len` bytes forwarded in `direction` and stamps
    /// the last-activity time.
    pub fn record_transfer(&self, direction: Direction, len: usize) {
        let (messages, bytes) = match direction {
            Direction::IpToSerial => (&self.ip_to_serial_messages, &self.ip_to_serial_bytes),
            Direction::SerialToIp => (&self.serial_to_ip_messages, &self.serial_to_ip_bytes),
        };
        messages.fetch_add(1, Ordering::Relaxed);
        bytes.fetch_add(len as u64, Ordering::Relaxed);
        self.last_activity.store(unix_timestamp(), Ordering::Relaxed);
    }

    /// Records whether the serial device is currently open.
    pub fn set_serial_open(&self, open: bool) {
        self.serial_open.store(open, Ordering::Relaxed);
    }

    pub fn active_clients(&self) -> u64 {
        self.active_clients.load(Ordering::Relaxed)
    }

    pub fn serial_open(&self) -> bool {
        self.serial_open.load(Ordering::Relaxed)
    }

    /// Returns a consistent-enough copy of every counter.
    ///
    /// Each field is loaded independently; a snapshot taken while traffic is
    /// flowing may mix values from adjacent instants.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            start_time: self.start_time,
            active_clients: self.active_clients.load(Ordering::Relaxed),
            total_connections: self.total_connections.load(Ordering::Relaxed),
            ip_to_serial_messages: self.ip_to_serial_messages.load(Ordering::Relaxed),
            ip_to_serial_bytes: self.ip_to_serial_bytes.load(Ordering::Relaxed),
            serial_to_ip_messages: self.serial_to_ip_messages.load(Ordering::Relaxed),
            serial_to_ip_bytes: self.serial_to_ip_bytes.load(Ordering::Relaxed),
            last_activity: self.last_activity.load(Ordering::Relaxed),
            serial_open: self.serial_open.load(Ordering::Relaxed),
        }
    }
}

impl Default for BridgeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall-clock time in whole seconds since the Unix epoch.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_stats_are_zeroed() {
        let stats = BridgeStats::new();
        let snap = stats.snapshot();

        assert_eq!(snap.active_clients, 0);
        assert_eq!(snap.total_connections, 0);
        assert_eq!(snap.ip_to_serial_messages, 0);
        assert_eq!(snap.serial_to_ip_messages, 0);
        assert_eq!(snap.last_activity, 0);
        assert!(!snap.serial_open);
        assert!(snap.start_time > 0);
    }

    #[test]
    fn test_record_transfer_counts_direction_separately() {
        // Arrange
        let stats = BridgeStats::new();

        // Act
        stats.record_transfer(Direction::IpToSerial, 6);
        stats.record_transfer(Direction::SerialToIp, 3);
        stats.record_transfer(Direction::SerialToIp, 3);

        // Assert
        let snap = stats.snapshot();
        assert_eq!(snap.ip_to_serial_messages, 1);
        assert_eq!(snap.ip_to_serial_bytes, 6);
        assert_eq!(snap.serial_to_ip_messages, 2);
        assert_eq!(snap.serial_to_ip_bytes, 6);
        assert!(snap.last_activity >= snap.start_time);
    }

    #[test]
    fn test_active_clients_tracks_latest_value() {
        let stats = BridgeStats::new();
        stats.set_active_clients(3);
        stats.set_active_clients(1);
        assert_eq!(stats.active_clients(), 1);
    }

    #[test]
    fn test_total_connections_only_grows() {
        let stats = BridgeStats::new();
        stats.record_connection();
        stats.record_connection();
        stats.set_active_clients(0);
        assert_eq!(stats.snapshot().total_connections, 2);
    }

    #[test]
    fn test_serial_open_flag() {
        let stats = BridgeStats::new();
        stats.set_serial_open(true);
        assert!(stats.serial_open());
        stats.set_serial_open(false);
        assert!(!stats.serial_open());
    }

    #[test]
    fn test_uptime_saturates() {
        let snap = BridgeStats::new().snapshot();
        assert_eq!(snap.uptime_secs(0), 0);
        assert_eq!(snap.uptime_secs(snap.start_time + 42), 42);
    }

    #[test]
    fn test_concurrent_transfers_are_all_counted() {
        let stats = Arc::new(BridgeStats::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..250 {
                        s.record_transfer(Direction::IpToSerial, 2);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread panicked");
        }

        let snap = stats.snapshot();
        assert_eq!(snap.ip_to_serial_messages, 1000);
        assert_eq!(snap.ip_to_serial_bytes, 2000);
    }
}

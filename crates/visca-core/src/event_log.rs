//! Fixed-capacity ring buffer of recent bridge events.
//!
//! The bridge may run for months on a small board, so the event history shown
//! by the admin UI must not grow without bound.  [`EventLog`] keeps at most
//! `capacity` entries; when full, the oldest entry is evicted first.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::stats::unix_timestamp;

/// Severity of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Single-letter code used on the wire by the admin API (`"I"`, `"W"`, `"E"`).
    pub fn code(self) -> &'static str {
        match self {
            Severity::Info => "I",
            Severity::Warn => "W",
            Severity::Error => "E",
        }
    }
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    pub severity: Severity,
    pub message: String,
}

/// Thread-safe bounded event log.
///
/// # Examples
///
/// ```rust
/// use visca_core::{EventLog, Severity};
///
/// let log = EventLog::new(2);
/// log.record(Severity::Info, "a");
/// log.record(Severity::Info, "b");
/// log.record(Severity::Info, "c");
///
/// let recent = log.recent(10);
/// assert_eq!(recent.len(), 2);
/// assert_eq!(recent[0].message, "c"); // newest first
/// assert_eq!(recent[1].message, "b");
/// ```
#[derive(Debug)]
pub struct EventLog {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl EventLog {
    /// Creates an empty log holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one so the log always keeps the latest
    /// event.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Appends an entry stamped with the current time, evicting the oldest
    /// entry when the log is full.
    pub fn record(&self, severity: Severity, message: impl Into<String>) {
        self.push(LogEntry {
            timestamp: unix_timestamp(),
            severity,
            message: message.into(),
        });
    }

    /// Appends a pre-built entry.
    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Returns up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.lock().iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic while holding the lock cannot leave the deque half-modified, so
    // a poisoned mutex is still safe to use.
    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//! JSON message types for the admin HTTP API.
//!
//! The admin UI is a small web page that polls `/api/stats` every couple of
//! seconds and posts commands to `/api/cmd`.  Its field names are terse
//! (`cli`, `i2r`, `r2i`) because the page was first written for a Raspberry Pi
//! Zero where every byte of JSON counted; they are kept as-is so existing UIs
//! keep working.
//!
//! # Message flow
//!
//! ```text
//! GET  /api/stats    → StatsResponse
//! POST /api/cmd      ← CommandRequest   → CommandResponse
//! ```

use serde::{Deserialize, Serialize};
use visca_core::{BridgeError, LogEntry};

// ── Status ────────────────────────────────────────────────────────────────────

/// One event-log entry as the UI expects it.
///
/// ```json
/// {"t":1718000000,"l":"I","m":"Client: 10.0.0.7"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntryJson {
    /// Unix timestamp in seconds.
    pub t: u64,
    /// First letter of the severity: `"I"`, `"W"` or `"E"`.
    pub l: String,
    /// Message text.
    pub m: String,
}

impl From<&LogEntry> for LogEntryJson {
    fn from(entry: &LogEntry) -> Self {
        Self {
            t: entry.timestamp,
            l: entry.severity.code().to_string(),
            m: entry.message.clone(),
        }
    }
}

/// Body of `GET /api/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// `true` while the bridge loop is running.
    pub run: bool,
    /// `true` while the serial device is open.
    pub ser: bool,
    /// Currently connected TCP clients.
    pub cli: u64,
    /// TCP connections accepted since start.
    pub tot: u64,
    /// Messages forwarded IP → serial.
    pub i2r: u64,
    /// Messages forwarded serial → IP.
    pub r2i: u64,
    /// Last serial activity, unix seconds (0 = never).
    pub act: u64,
    /// Process start, unix seconds.
    pub start: u64,
    /// Serial device path.
    pub port: String,
    pub baud: u32,
    /// VISCA TCP port.
    pub vport: u16,
    /// Up to 20 most recent events, newest first.
    pub log: Vec<LogEntryJson>,
    /// Uptime in seconds.
    pub up: u64,
    pub i2r_bytes: u64,
    pub r2i_bytes: u64,
    /// Admin HTTP port.
    pub aport: u16,
    /// Response timeout in milliseconds.
    pub rto: u64,
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Body of `POST /api/cmd`.
///
/// ```json
/// {"hex":"81 01 04 07 02 FF"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandRequest {
    /// A missing field deserialises as an empty string, which command
    /// submission rejects as invalid input.
    #[serde(default)]
    pub hex: String,
}

/// Body returned by the command endpoints.
///
/// ```json
/// {"ok":true,"resp":"9041ff"}
/// {"ok":true,"resp":null}
/// {"ok":false,"resp":null,"err":"InvalidInput: Invalid character 'z' at position 0"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub ok: bool,
    /// Lowercase hex of the camera's reply; `null` if none arrived in time.
    pub resp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

impl CommandResponse {
    pub fn success(resp: Option<String>) -> Self {
        Self {
            ok: true,
            resp,
            err: None,
        }
    }

    /// Builds a failure response whose `err` starts with the error kind
    /// (e.g. `"InvalidInput: ..."`), so the UI can match on the prefix.
    pub fn failure(error: &BridgeError) -> Self {
        Self {
            ok: false,
            resp: None,
            err: Some(format!("{}: {error}", error.kind())),
        }
    }

    pub fn failure_message(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            resp: None,
            err: Some(message.into()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

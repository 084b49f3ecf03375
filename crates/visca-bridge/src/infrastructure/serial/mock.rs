//! In-memory serial device for tests.
//!
//! [`MockSerialPort`] behaves like a camera on the other end of the wire:
//! it answers scripted requests (optionally after a delay), can be told to
//! emit unsolicited bytes, and can simulate a device that refuses writes.
//! Every write and every non-empty read is appended to a journal so tests can
//! check the order in which the bridge touched the line.
//!
//! Clones share state, so a test keeps one clone for scripting and
//! inspection while the transport owns another.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::SerialIo;

/// One access to the mock device, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialOp {
    Write(Vec<u8>),
    Read(Vec<u8>),
}

#[derive(Default)]
struct MockState {
    inbound: VecDeque<u8>,
    pending: Vec<(Instant, Vec<u8>)>,
    replies: HashMap<Vec<u8>, Vec<u8>>,
    reply_delay: Duration,
    fail_writes: bool,
    journal: Vec<SerialOp>,
}

impl MockState {
    /// Moves replies whose delay has elapsed into the receive buffer.
    fn release_due(&mut self) {
        let now = Instant::now();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].0 <= now {
                let (_, bytes) = self.pending.remove(i);
                self.inbound.extend(bytes);
            } else {
                i += 1;
            }
        }
    }
}

/// Scriptable stand-in for a VISCA camera on a serial line.
#[derive(Clone, Default)]
pub struct MockSerialPort {
    state: Arc<Mutex<MockState>>,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whenever exactly `request` is written, `reply` becomes readable.
    pub fn reply_to(&self, request: &[u8], reply: &[u8]) {
        self.lock().replies.insert(request.to_vec(), reply.to_vec());
    }

    /// Delays every scripted reply by `delay` after its request is written.
    pub fn set_reply_delay(&self, delay: Duration) {
        self.lock().reply_delay = delay;
    }

    /// Makes `bytes` readable immediately, as if the camera sent them on its
    /// own.
    pub fn push_unsolicited(&self, bytes: &[u8]) {
        self.lock().inbound.extend(bytes.iter().copied());
    }

    /// While set, every write fails with `TimedOut`.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn journal(&self) -> Vec<SerialOp> {
        self.lock().journal.clone()
    }

    /// Just the written requests, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock()
            .journal
            .iter()
            .filter_map(|op| match op {
                SerialOp::Write(bytes) => Some(bytes.clone()),
                SerialOp::Read(_) => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SerialIo for MockSerialPort {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "mock write timeout"));
        }
        state.journal.push(SerialOp::Write(bytes.to_vec()));
        if let Some(reply) = state.replies.get(bytes).cloned() {
            let due = Instant::now() + state.reply_delay;
            state.pending.push((due, reply));
        }
        Ok(())
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        let mut state = self.lock();
        state.release_due();
        Ok(state.inbound.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.lock();
        state.release_due();
        let n = buf.len().min(state.inbound.len());
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "mock read timeout"));
        }
        let bytes: Vec<u8> = state.inbound.drain(..n).collect();
        buf[..n].copy_from_slice(&bytes);
        state.journal.push(SerialOp::Read(bytes));
        Ok(n)
    }
}

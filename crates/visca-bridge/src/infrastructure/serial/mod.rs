//! Serial transport: the one handle to the camera's serial line.
//!
//! # How reading works (for beginners)
//!
//! A serial port has no "message received" event the async runtime could wait
//! on.  Bytes trickle into the driver's buffer at line speed (about one byte
//! per millisecond at 9600 baud), and the program has to ask how many are
//! there.  [`SerialTransport::read_frame`] therefore polls: it reads whatever
//! is buffered, checks whether the frame terminator (`0xFF`) has arrived, and
//! if not sleeps for [`READ_POLL_INTERVAL`] and tries again until the timeout
//! expires.
//!
//! ```text
//! write(81 01 04 07 02 FF)
//! poll  → 90           (not complete, keep going)
//! poll  → 41 FF        (terminator: return 90 41 FF)
//! ```
//!
//! Well-formed replies end the wait as soon as the terminator arrives; a
//! silent or confused camera costs at most one timeout.
//!
//! # Bytes that do not belong to the reply
//!
//! If a read returns more than the first frame (for example ACK and
//! completion back to back), the extra bytes are kept in a carry buffer and
//! returned by the next [`SerialTransport::drain_non_blocking`], which the
//! bridge broadcasts as unsolicited data.  Bytes already waiting in the driver
//! *before* a request is written are moved to the same carry buffer, so a
//! reply is always made of bytes that arrived after its request.
//!
//! All methods block the calling thread.  Only the serial worker thread
//! (`infrastructure::serial_worker`) calls them.

pub mod mock;
pub mod system;

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;
use visca_core::{encode_hex, BridgeError, Direction, FrameAssembler, StatsSink};

use crate::domain::config::SerialConfig;

/// Pause between two polls of the device buffer while waiting for a reply.
pub const READ_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Largest single read from the device.
const READ_CHUNK: usize = 256;

/// Upper bound on bytes collected by one drain, so a device that never stops
/// talking cannot pin the worker.
const MAX_DRAIN_BYTES: usize = 4096;

/// Raw byte access to a serial device.
///
/// Implemented by [`system::SystemSerialPort`] for real hardware and by
/// [`mock::MockSerialPort`] in tests.
pub trait SerialIo: Send {
    /// Writes every byte or fails.  A device that cannot accept the data in
    /// time reports `io::ErrorKind::TimedOut`.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Number of bytes waiting in the receive buffer.
    fn bytes_to_read(&mut self) -> io::Result<usize>;

    /// Reads up to `buf.len()` bytes.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// The serial link with frame-aware reads and traffic accounting.
pub struct SerialTransport {
    port: Box<dyn SerialIo>,
    sink: Arc<StatsSink>,
    carry: Vec<u8>,
    /// Where in `carry` the last reply would sit, between the stale bytes set
    /// aside before the write and the surplus read after the frame.
    reply_at: usize,
    /// Bytes in `carry` already counted as received.
    counted: usize,
}

impl SerialTransport {
    /// Opens the configured device with 8 data bits, no parity, 1 stop bit.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TransportUnavailable`] if the device cannot be
    /// opened.  Callers treat this as fatal; there is no retry.
    pub fn open(config: &SerialConfig, sink: Arc<StatsSink>) -> Result<Self, BridgeError> {
        let port = system::SystemSerialPort::open(config).map_err(|e| {
            BridgeError::TransportUnavailable {
                path: config.path.clone(),
                reason: e.to_string(),
            }
        })?;
        sink.info(format!("Serial: {}@{}", config.path, config.baud_rate));
        Ok(Self::new(Box::new(port), sink))
    }

    /// Wraps an already-open device.
    pub fn new(port: Box<dyn SerialIo>, sink: Arc<StatsSink>) -> Self {
        sink.stats.set_serial_open(true);
        Self {
            port,
            sink,
            carry: Vec::new(),
            reply_at: 0,
            counted: 0,
        }
    }

    /// Writes raw bytes to the device.
    ///
    /// # Errors
    ///
    /// [`BridgeError::WriteTimeout`] if the device did not accept the bytes
    /// within its write timeout; [`BridgeError::TransportIo`] otherwise.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), BridgeError> {
        self.port.write_all(bytes).map_err(|e| match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => BridgeError::WriteTimeout,
            _ => BridgeError::TransportIo(e.to_string()),
        })?;
        self.sink.stats.record_transfer(Direction::IpToSerial, bytes.len());
        debug!("serial ← {}", encode_hex(bytes));
        Ok(())
    }

    /// Reads until the first frame terminator or until `timeout` elapses.
    ///
    /// Returns the complete frame, the partial bytes received before the
    /// timeout, or `None` if nothing arrived.
    pub fn read_frame(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, BridgeError> {
        // A wait too long to represent is as good as forever.
        let deadline = Instant::now()
            .checked_add(timeout)
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400 * 365));
        let mut assembler = FrameAssembler::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            let n = self.read_available(&mut buf)?;
            if n > 0 {
                let surplus = assembler.push(&buf[..n]);
                if assembler.is_complete() {
                    self.carry.extend_from_slice(surplus);
                    break;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            if n == 0 {
                thread::sleep(READ_POLL_INTERVAL.min(deadline - now));
            }
        }

        let frame = assembler.finish();
        if let Some(bytes) = &frame {
            self.sink.stats.record_transfer(Direction::SerialToIp, bytes.len());
            debug!("serial → {}", encode_hex(bytes));
        }
        Ok(frame)
    }

    /// Returns carried-over bytes plus anything buffered on the device,
    /// without waiting.  `None` when there is nothing.
    pub fn drain_non_blocking(&mut self) -> Result<Option<Vec<u8>>, BridgeError> {
        let mut out = std::mem::take(&mut self.carry);
        let counted = std::mem::take(&mut self.counted);
        self.reply_at = 0;
        self.read_into(&mut out)?;

        if out.is_empty() {
            return Ok(None);
        }
        if out.len() > counted {
            self.sink
                .stats
                .record_transfer(Direction::SerialToIp, out.len() - counted);
        }
        debug!("serial → (unsolicited) {}", encode_hex(&out));
        Ok(Some(out))
    }

    /// Writes `request` and collects its reply as one uninterrupted cycle.
    ///
    /// Bytes already waiting on the device are set aside first so they are
    /// not mistaken for the reply.
    pub fn exchange(
        &mut self,
        request: &[u8],
        wait: Duration,
    ) -> Result<Option<Vec<u8>>, BridgeError> {
        let mut stale = std::mem::take(&mut self.carry);
        self.read_into(&mut stale)?;
        self.carry = stale;
        self.reply_at = self.carry.len();

        self.write(request)?;
        self.read_frame(wait)
    }

    /// Puts a reply nobody is waiting for back into the carry buffer, where
    /// the last [`exchange`](Self::exchange) read it, so the next drain
    /// forwards it.  Its bytes were already counted and are not counted again.
    pub fn carry_over(&mut self, reply: &[u8]) {
        let at = self.reply_at.min(self.carry.len());
        self.carry.splice(at..at, reply.iter().copied());
        self.reply_at = at + reply.len();
        self.counted += reply.len();
    }

    fn read_into(&mut self, out: &mut Vec<u8>) -> Result<(), BridgeError> {
        let mut buf = [0u8; READ_CHUNK];
        while out.len() < MAX_DRAIN_BYTES {
            let n = self.read_available(&mut buf)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        Ok(())
    }

    /// Reads whatever is buffered right now; 0 when empty.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, BridgeError> {
        let waiting = self.port.bytes_to_read().map_err(transport_io)?;
        if waiting == 0 {
            return Ok(0);
        }
        let len = waiting.min(buf.len());
        match self.port.read(&mut buf[..len]) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(transport_io(e)),
        }
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.sink.stats.set_serial_open(false);
    }
}

fn transport_io(e: io::Error) -> BridgeError {
    BridgeError::TransportIo(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::mock::{MockSerialPort, SerialOp};
    use super::*;

    const ZOOM_TELE: [u8; 6] = [0x81, 0x01, 0x04, 0x07, 0x02, 0xFF];
    const ACK: [u8; 3] = [0x90, 0x41, 0xFF];
    const COMPLETION: [u8; 3] = [0x90, 0x51, 0xFF];

    fn transport(mock: &MockSerialPort) -> (SerialTransport, Arc<StatsSink>) {
        let sink = Arc::new(StatsSink::new(10));
        let t = SerialTransport::new(Box::new(mock.clone()), Arc::clone(&sink));
        (t, sink)
    }

    #[test]
    fn test_exchange_returns_reply_frame_and_counts_both_directions() {
        // Arrange
        let mock = MockSerialPort::new();
        mock.reply_to(&ZOOM_TELE, &ACK);
        let (mut t, sink) = transport(&mock);

        // Act
        let reply = t.exchange(&ZOOM_TELE, Duration::from_millis(200)).unwrap();

        // Assert
        assert_eq!(reply, Some(ACK.to_vec()));
        let snap = sink.stats.snapshot();
        assert_eq!(snap.ip_to_serial_messages, 1);
        assert_eq!(snap.ip_to_serial_bytes, 6);
        assert_eq!(snap.serial_to_ip_messages, 1);
        assert_eq!(snap.serial_to_ip_bytes, 3);
    }

    #[test]
    fn test_read_frame_stops_at_first_terminator_and_carries_rest() {
        let mock = MockSerialPort::new();
        let mut both = ACK.to_vec();
        both.extend_from_slice(&COMPLETION);
        mock.reply_to(&ZOOM_TELE, &both);
        let (mut t, _sink) = transport(&mock);

        let reply = t.exchange(&ZOOM_TELE, Duration::from_millis(200)).unwrap();
        let rest = t.drain_non_blocking().unwrap();

        assert_eq!(reply, Some(ACK.to_vec()));
        assert_eq!(rest, Some(COMPLETION.to_vec()));
    }

    #[test]
    fn test_read_frame_returns_partial_bytes_on_timeout() {
        let mock = MockSerialPort::new();
        mock.reply_to(&ZOOM_TELE, &[0x90, 0x41]);
        let (mut t, _sink) = transport(&mock);

        let started = Instant::now();
        let reply = t.exchange(&ZOOM_TELE, Duration::from_millis(50)).unwrap();

        assert_eq!(reply, Some(vec![0x90, 0x41]));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_read_frame_returns_none_when_silent() {
        let mock = MockSerialPort::new();
        let (mut t, sink) = transport(&mock);

        let reply = t.exchange(&ZOOM_TELE, Duration::from_millis(30)).unwrap();

        assert_eq!(reply, None);
        assert_eq!(sink.stats.snapshot().serial_to_ip_messages, 0);
    }

    #[test]
    fn test_delayed_reply_is_collected_within_timeout() {
        let mock = MockSerialPort::new();
        mock.reply_to(&ZOOM_TELE, &ACK);
        mock.set_reply_delay(Duration::from_millis(20));
        let (mut t, _sink) = transport(&mock);

        let reply = t.exchange(&ZOOM_TELE, Duration::from_millis(500)).unwrap();

        assert_eq!(reply, Some(ACK.to_vec()));
    }

    #[test]
    fn test_write_timeout_is_reported_without_counting() {
        let mock = MockSerialPort::new();
        mock.fail_writes(true);
        let (mut t, sink) = transport(&mock);

        let err = t.write(&ZOOM_TELE).unwrap_err();

        assert!(matches!(err, BridgeError::WriteTimeout));
        assert_eq!(sink.stats.snapshot().ip_to_serial_messages, 0);
    }

    #[test]
    fn test_stale_bytes_are_not_taken_as_reply() {
        // Arrange: a notification is waiting before the request goes out.
        let mock = MockSerialPort::new();
        mock.push_unsolicited(&[0x90, 0x07, 0x04, 0xFF]);
        mock.reply_to(&ZOOM_TELE, &ACK);
        let (mut t, _sink) = transport(&mock);

        // Act
        let reply = t.exchange(&ZOOM_TELE, Duration::from_millis(200)).unwrap();
        let unsolicited = t.drain_non_blocking().unwrap();

        // Assert
        assert_eq!(reply, Some(ACK.to_vec()));
        assert_eq!(unsolicited, Some(vec![0x90, 0x07, 0x04, 0xFF]));
    }

    #[test]
    fn test_drain_is_none_when_idle() {
        let mock = MockSerialPort::new();
        let (mut t, _sink) = transport(&mock);
        assert_eq!(t.drain_non_blocking().unwrap(), None);
    }

    #[test]
    fn test_drain_returns_unsolicited_bytes_and_counts_them() {
        let mock = MockSerialPort::new();
        mock.push_unsolicited(&[0x90, 0x07, 0x04, 0xFF]);
        let (mut t, sink) = transport(&mock);

        let bytes = t.drain_non_blocking().unwrap();

        assert_eq!(bytes, Some(vec![0x90, 0x07, 0x04, 0xFF]));
        assert_eq!(sink.stats.snapshot().serial_to_ip_messages, 1);
        assert_eq!(t.drain_non_blocking().unwrap(), None);
    }

    #[test]
    fn test_journal_records_write_then_read() {
        let mock = MockSerialPort::new();
        mock.reply_to(&ZOOM_TELE, &ACK);
        let (mut t, _sink) = transport(&mock);

        t.exchange(&ZOOM_TELE, Duration::from_millis(200)).unwrap();

        assert_eq!(
            mock.journal(),
            vec![SerialOp::Write(ZOOM_TELE.to_vec()), SerialOp::Read(ACK.to_vec())]
        );
    }

    #[test]
    fn test_dropping_transport_clears_serial_open() {
        let mock = MockSerialPort::new();
        let (t, sink) = transport(&mock);
        assert!(sink.stats.serial_open());

        drop(t);

        assert!(!sink.stats.serial_open());
    }

    #[test]
    fn test_open_missing_device_is_transport_unavailable() {
        let sink = Arc::new(StatsSink::new(10));
        let config = SerialConfig {
            path: "/dev/does-not-exist-visca".to_string(),
            ..SerialConfig::default()
        };

        let err = match SerialTransport::open(&config, sink) {
            Ok(_) => panic!("opening a missing device must fail"),
            Err(e) => e,
        };

        assert!(matches!(err, BridgeError::TransportUnavailable { .. }));
    }

    #[test]
    fn test_unbounded_wait_does_not_overflow() {
        let mock = MockSerialPort::new();
        mock.reply_to(&ZOOM_TELE, &ACK);
        let (mut t, _sink) = transport(&mock);

        let reply = t.exchange(&ZOOM_TELE, Duration::MAX).unwrap();

        assert_eq!(reply, Some(ACK.to_vec()));
    }

    #[test]
    fn test_carried_over_reply_is_drained_in_order_and_counted_once() {
        // Arrange: a notification waits before the write; the reply is
        // followed by a completion.
        let mock = MockSerialPort::new();
        mock.push_unsolicited(&[0x90, 0x07, 0x04, 0xFF]);
        let mut both = ACK.to_vec();
        both.extend_from_slice(&COMPLETION);
        mock.reply_to(&ZOOM_TELE, &both);
        let (mut t, sink) = transport(&mock);

        // Act: nobody wants the reply, so it goes back to the carry buffer.
        let reply = t.exchange(&ZOOM_TELE, Duration::from_millis(200)).unwrap();
        t.carry_over(&reply.unwrap());
        let drained = t.drain_non_blocking().unwrap().unwrap();

        // Assert
        let mut expected = vec![0x90, 0x07, 0x04, 0xFF];
        expected.extend_from_slice(&ACK);
        expected.extend_from_slice(&COMPLETION);
        assert_eq!(drained, expected);
        let snap = sink.stats.snapshot();
        assert_eq!(snap.serial_to_ip_bytes, 10);
        assert_eq!(t.drain_non_blocking().unwrap(), None);
    }
}

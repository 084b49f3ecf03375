//! Real serial hardware via the `serialport` crate.

use std::io::{self, Read, Write};

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use super::SerialIo;
use crate::domain::config::SerialConfig;

/// An open OS serial device configured for VISCA (8-N-1, no flow control).
pub struct SystemSerialPort {
    port: Box<dyn SerialPort>,
}

impl SystemSerialPort {
    /// Opens `config.path` at `config.baud_rate`.  The device timeout applies
    /// to both reads and writes.
    pub fn open(config: &SerialConfig) -> Result<Self, serialport::Error> {
        let port = serialport::new(&config.path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.io_timeout)
            .open()?;
        Ok(Self { port })
    }
}

impl SerialIo for SystemSerialPort {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(io::Error::from)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

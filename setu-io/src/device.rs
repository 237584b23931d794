//! Byte-device abstraction and the serial port implementation.

use crate::error::{Error, Result};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::{Duration, Instant};

/// A byte-oriented device the transport can drive.
///
/// Implementations are exclusive owners of the underlying channel; sharing
/// happens one level up, behind [`crate::link::RobotLink`]'s lock.
pub trait SerialDevice: Send {
    /// Read exactly `buf.len()` bytes, or fail within `timeout`.
    ///
    /// Fails with [`Error::Timeout`] when nothing arrived in the window and
    /// [`Error::ShortRead`] when only part of the buffer filled. In both
    /// cases the buffer contents are meaningless and must not be used.
    fn read_exact_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()>;

    /// Write the whole buffer and push it onto the wire.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Drop any buffered receive bytes; returns how many were discarded.
    fn discard_input(&mut self) -> Result<usize>;
}

/// Serial device over a real UART.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open a serial port configured 8N1 with no flow control.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(100))
            .open()?;

        log::info!("opened serial port {} at {} baud", path, baud_rate);

        // Start from a clean pipe; the robot may have been chattering
        // before we attached.
        port.clear(ClearBuffer::Input)?;

        Ok(SerialLink { port })
    }
}

impl SerialDevice for SerialLink {
    fn read_exact_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut filled = 0;

        while filled < buf.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.port.set_timeout(remaining)?;
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e.into()),
            }
        }

        match filled {
            n if n == buf.len() => Ok(()),
            0 => Err(Error::Timeout),
            got => Err(Error::ShortRead {
                wanted: buf.len(),
                got,
            }),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn discard_input(&mut self) -> Result<usize> {
        let pending = self.port.bytes_to_read()? as usize;
        self.port.clear(ClearBuffer::Input)?;
        Ok(pending)
    }
}

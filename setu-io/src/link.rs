//! Locked request/response link to the robot.
//!
//! Every logical operation is one exchange: acquire the device lock, write
//! the request frame, read and validate the response, release the lock.
//! The lock is what lets the navigation executor and the sensor poller
//! share a single half-duplex line that has no way to tell two in-flight
//! exchanges apart.

use crate::device::SerialDevice;
use crate::error::{Error, Result};
use crate::frame::{self, Message, SensorReport, HEADER_LEN};
use parking_lot::Mutex;
use std::time::Duration;

/// Shared handle to the robot's serial channel.
pub struct RobotLink<D: SerialDevice> {
    device: Mutex<D>,
    read_timeout: Duration,
}

impl<D: SerialDevice> RobotLink<D> {
    pub fn new(device: D, read_timeout: Duration) -> Self {
        RobotLink {
            device: Mutex::new(device),
            read_timeout,
        }
    }

    /// Perform one request/response exchange.
    ///
    /// A short read or an invalid frame means stale bytes were sitting in
    /// the receive buffer; those are recovered once, by flushing and
    /// re-issuing the request. A silent timeout is returned as-is; whether
    /// to retry a robot that said nothing is the caller's call.
    pub fn transact(&self, request: &Message) -> Result<Message> {
        let mut device = self.device.lock();

        let first = Self::exchange(&mut *device, request, self.read_timeout);
        let recoverable = matches!(
            first,
            Err(Error::ShortRead { .. }) | Err(Error::InvalidFrame(_))
        );
        if !recoverable {
            return first;
        }

        let dropped = device.discard_input().unwrap_or(0);
        log::debug!(
            "exchange for {:?} failed ({}), flushed {} bytes, re-issuing once",
            request.id(),
            first.as_ref().err().map(|e| e.to_string()).unwrap_or_default(),
            dropped
        );

        let second = Self::exchange(&mut *device, request, self.read_timeout);
        if matches!(
            second,
            Err(Error::ShortRead { .. }) | Err(Error::InvalidFrame(_))
        ) {
            // Leave the pipe clean for the next operation.
            let _ = device.discard_input();
        }
        second
    }

    fn exchange(device: &mut D, request: &Message, timeout: Duration) -> Result<Message> {
        device.write_all(&request.encode())?;

        let mut header = [0u8; HEADER_LEN];
        device.read_exact_timeout(&mut header, timeout)?;
        let id = frame::validate_header(&header)?;

        let mut payload = vec![0u8; id.payload_len()];
        if !payload.is_empty() {
            device.read_exact_timeout(&mut payload, timeout)?;
        }
        Message::decode_payload(id, &payload)
    }

    fn expect_ack(reply: Message) -> Result<()> {
        match reply {
            Message::Ack => Ok(()),
            other => Err(Error::InvalidFrame(format!(
                "expected ack, got {:?}",
                other.id()
            ))),
        }
    }

    /// Drive at a signed rate in mm/s; zero stops the robot.
    pub fn drive(&self, rate: i16) -> Result<()> {
        Self::expect_ack(self.transact(&Message::DriveStraight { rate })?)
    }

    /// Rotate 90° counter-clockwise; blocks until the robot acks.
    pub fn rotate_left(&self) -> Result<()> {
        Self::expect_ack(self.transact(&Message::RotateLeft)?)
    }

    /// Rotate 90° clockwise; blocks until the robot acks.
    pub fn rotate_right(&self) -> Result<()> {
        Self::expect_ack(self.transact(&Message::RotateRight)?)
    }

    /// Request a sensor report.
    pub fn read_sensors(&self) -> Result<SensorReport> {
        match self.transact(&Message::SensorRead)? {
            Message::SensorData(report) => Ok(report),
            other => Err(Error::InvalidFrame(format!(
                "expected sensor data, got {:?}",
                other.id()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::MAGIC;
    use crate::mock::MockDevice;

    fn ack_frame() -> Vec<u8> {
        Message::Ack.encode()
    }

    fn sensor_frame(report: SensorReport) -> Vec<u8> {
        Message::SensorData(report).encode()
    }

    #[test]
    fn drive_sends_frame_and_takes_ack() {
        let device = MockDevice::new();
        device.respond_with(|_| Message::Ack.encode());
        let link = RobotLink::new(device.clone(), Duration::from_millis(50));

        link.drive(-100).unwrap();

        let writes = device.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0], Message::DriveStraight { rate: -100 }.encode());
    }

    #[test]
    fn sensor_read_returns_report() {
        let report = SensorReport {
            bumper: true,
            wall: false,
            rate: 100,
            direction: 1,
            x: 192,
            y: -42,
        };
        let device = MockDevice::new();
        device.respond_with(move |_| sensor_frame(report));
        let link = RobotLink::new(device, Duration::from_millis(50));

        assert_eq!(link.read_sensors().unwrap(), report);
    }

    #[test]
    fn silent_device_times_out_without_retry() {
        let device = MockDevice::new();
        device.respond_with(|_| Vec::new());
        let link = RobotLink::new(device.clone(), Duration::from_millis(10));

        assert!(matches!(link.rotate_left(), Err(Error::Timeout)));
        // No automatic re-issue on a pure timeout
        assert_eq!(device.writes().len(), 1);
    }

    #[test]
    fn stale_bytes_are_flushed_and_request_reissued_once() {
        let mut calls = 0;
        let device = MockDevice::new();
        // First exchange sees garbage ahead of the response; the link must
        // flush and re-issue, and the second exchange succeeds.
        device.respond_with(move |_| {
            calls += 1;
            if calls == 1 {
                vec![0xde, 0xad, 0xbe, 0xef]
            } else {
                ack_frame()
            }
        });
        let link = RobotLink::new(device.clone(), Duration::from_millis(50));

        link.rotate_right().unwrap();
        assert_eq!(device.writes().len(), 2);
        assert!(device.discarded() > 0);
    }

    #[test]
    fn short_response_is_retried_once_then_fails() {
        let device = MockDevice::new();
        // Always one byte short of a header
        device.respond_with(|_| vec![MAGIC, 0x37]);
        let link = RobotLink::new(device.clone(), Duration::from_millis(10));

        assert!(matches!(
            link.rotate_left(),
            Err(Error::ShortRead { wanted: 3, got: 2 })
        ));
        assert_eq!(device.writes().len(), 2);
    }

    #[test]
    fn unexpected_reply_id_is_an_error() {
        let device = MockDevice::new();
        device.respond_with(|_| Message::SensorData(SensorReport::default()).encode());
        let link = RobotLink::new(device, Duration::from_millis(50));

        assert!(link.drive(50).is_err());
    }
}

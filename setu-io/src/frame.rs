//! Framed wire protocol.
//!
//! Frame format: `[MAGIC] [VERSION] [ID] [PAYLOAD]`
//!
//! The 3-byte header is fixed; the payload size and shape are determined
//! solely by the id. A receiver validates magic and version before trusting
//! the id at all. Multi-byte payload fields are little-endian on the wire
//! (both ends of the link are configured that way).

use crate::error::{Error, Result};

/// Identifies the protocol on the wire
pub const MAGIC: u8 = 0x13;
/// Protocol version, bumped on any frame-layout change
pub const VERSION: u8 = 0x37;
/// Header size: magic + version + id
pub const HEADER_LEN: usize = 3;

/// Valid message identifiers
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageId {
    /// Drive forward at a signed rate. Acked when accepted.
    DriveStraight = 0,
    /// Request a sensor report (no payload)
    SensorRead = 1,
    /// Sensor report (response to SensorRead)
    SensorData = 2,
    /// General acknowledgement; indicates the command completed
    Ack = 3,
    /// Turn left (CCW) 90 degrees. Acked on completion.
    RotateLeft = 4,
    /// Turn right (CW) 90 degrees. Acked on completion.
    RotateRight = 5,
}

impl MessageId {
    /// Parse an id byte
    pub fn from_u8(v: u8) -> Option<MessageId> {
        match v {
            0 => Some(MessageId::DriveStraight),
            1 => Some(MessageId::SensorRead),
            2 => Some(MessageId::SensorData),
            3 => Some(MessageId::Ack),
            4 => Some(MessageId::RotateLeft),
            5 => Some(MessageId::RotateRight),
            _ => None,
        }
    }

    /// Exact payload size for this id
    pub fn payload_len(self) -> usize {
        match self {
            MessageId::DriveStraight => 2,
            MessageId::SensorData => 13,
            MessageId::SensorRead
            | MessageId::Ack
            | MessageId::RotateLeft
            | MessageId::RotateRight => 0,
        }
    }
}

/// Sensor report payload
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SensorReport {
    /// Bumper contact
    pub bumper: bool,
    /// Wall proximity
    pub wall: bool,
    /// Current drive rate (mm/s, signed)
    pub rate: i16,
    /// Robot-reported facing, in the cardinal ordinal encoding
    pub direction: u8,
    /// Robot-reported x position (mm)
    pub x: i32,
    /// Robot-reported y position (mm)
    pub y: i32,
}

impl SensorReport {
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.bumper as u8);
        out.push(self.wall as u8);
        out.extend_from_slice(&self.rate.to_le_bytes());
        out.push(self.direction);
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
    }

    fn decode(payload: &[u8]) -> Result<Self> {
        debug_assert_eq!(payload.len(), MessageId::SensorData.payload_len());
        Ok(SensorReport {
            bumper: payload[0] != 0,
            wall: payload[1] != 0,
            rate: i16::from_le_bytes([payload[2], payload[3]]),
            direction: payload[4],
            x: i32::from_le_bytes([payload[5], payload[6], payload[7], payload[8]]),
            y: i32::from_le_bytes([payload[9], payload[10], payload[11], payload[12]]),
        })
    }
}

/// A protocol message, request or response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    DriveStraight { rate: i16 },
    SensorRead,
    SensorData(SensorReport),
    Ack,
    RotateLeft,
    RotateRight,
}

impl Message {
    /// Wire id of this message
    pub fn id(&self) -> MessageId {
        match self {
            Message::DriveStraight { .. } => MessageId::DriveStraight,
            Message::SensorRead => MessageId::SensorRead,
            Message::SensorData(_) => MessageId::SensorData,
            Message::Ack => MessageId::Ack,
            Message::RotateLeft => MessageId::RotateLeft,
            Message::RotateRight => MessageId::RotateRight,
        }
    }

    /// Encode header and payload into one frame
    pub fn encode(&self) -> Vec<u8> {
        let id = self.id();
        let mut out = Vec::with_capacity(HEADER_LEN + id.payload_len());
        out.push(MAGIC);
        out.push(VERSION);
        out.push(id as u8);
        match self {
            Message::DriveStraight { rate } => out.extend_from_slice(&rate.to_le_bytes()),
            Message::SensorData(report) => report.encode_into(&mut out),
            Message::SensorRead | Message::Ack | Message::RotateLeft | Message::RotateRight => {}
        }
        debug_assert_eq!(out.len(), HEADER_LEN + id.payload_len());
        out
    }

    /// Decode a payload for an already-validated id.
    ///
    /// The caller reads exactly [`MessageId::payload_len`] bytes first; a
    /// wrong-sized slice here is a caller bug surfaced as `InvalidFrame`.
    pub fn decode_payload(id: MessageId, payload: &[u8]) -> Result<Message> {
        if payload.len() != id.payload_len() {
            return Err(Error::InvalidFrame(format!(
                "id {:?} expects {} payload bytes, got {}",
                id,
                id.payload_len(),
                payload.len()
            )));
        }
        Ok(match id {
            MessageId::DriveStraight => Message::DriveStraight {
                rate: i16::from_le_bytes([payload[0], payload[1]]),
            },
            MessageId::SensorRead => Message::SensorRead,
            MessageId::SensorData => Message::SensorData(SensorReport::decode(payload)?),
            MessageId::Ack => Message::Ack,
            MessageId::RotateLeft => Message::RotateLeft,
            MessageId::RotateRight => Message::RotateRight,
        })
    }
}

/// Validate a received header and return its id.
///
/// Magic and version are checked before the id is interpreted; any mismatch
/// means the receive buffer holds stale or foreign bytes and the caller
/// must flush it.
pub fn validate_header(header: &[u8; HEADER_LEN]) -> Result<MessageId> {
    if header[0] != MAGIC || header[1] != VERSION {
        return Err(Error::InvalidFrame(format!(
            "bad magic/version {:#04x} {:#04x}",
            header[0], header[1]
        )));
    }
    MessageId::from_u8(header[2])
        .ok_or_else(|| Error::InvalidFrame(format!("unknown id {:#04x}", header[2])))
}

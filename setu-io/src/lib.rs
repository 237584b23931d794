//! Setu-IO - serial transport layer for Yatra
//!
//! Owns everything between the navigation logic and the wire: the framed
//! request/response protocol, the byte-device abstraction, and the locking
//! discipline that turns one half-duplex serial line into a
//! single-operation-at-a-time channel shared by the command actor and the
//! sensor poller.
//!
//! The protocol has no request ids or multiplexing, so correctness depends
//! on never interleaving two logical exchanges; [`link::RobotLink`] is the
//! one place that guarantee is enforced.

pub mod device;
pub mod error;
pub mod frame;
pub mod link;
pub mod mock;

pub use device::{SerialDevice, SerialLink};
pub use error::{Error, Result};
pub use frame::{Message, MessageId, SensorReport};
pub use link::RobotLink;
pub use mock::MockDevice;

//! Error types for Setu-IO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Transport and protocol error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No response bytes arrived within the read window
    #[error("read timed out")]
    Timeout,

    /// Fewer bytes than requested arrived within the read window.
    /// The partial buffer is never surfaced as a value.
    #[error("short read: wanted {wanted} bytes, got {got}")]
    ShortRead { wanted: usize, got: usize },

    /// Bad magic/version, unknown id, or a payload that does not parse
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

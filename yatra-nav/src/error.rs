//! Error types for YatraNav

use marga_grid::{GridCoord, GridError};
use thiserror::Error;

/// YatraNav error type
#[derive(Debug, Error)]
pub enum NavError {
    #[error("transport error: {0}")]
    Transport(#[from] setu_io::Error),

    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no route to ({x}, {y})")]
    Unreachable { x: i32, y: i32 },

    #[error("route abandoned after {0:.1?}")]
    RouteTimeout(std::time::Duration),

    /// A planned path contained a non-unit step. The pathfinder only emits
    /// 4-connected moves, so this indicates a corrupted path.
    #[error("path discontinuity between {from} and {to}")]
    PathDiscontinuity { from: GridCoord, to: GridCoord },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;

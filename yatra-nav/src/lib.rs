//! YatraNav library: navigation executor, sensor poller, operator commands.
//!
//! The binary in `main.rs` wires these together against a real serial
//! port; integration tests drive the same types against a mock device.

pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod poller;
pub mod pose;

pub use config::YatraConfig;
pub use error::{NavError, Result};
pub use executor::NavigationExecutor;
pub use poller::{ObstacleEvent, SensorPoller};
pub use pose::Pose;

//! Configuration loading for YatraNav

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct YatraConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub robot: RobotTuning,
    #[serde(default)]
    pub grid: GridConfig,
}

/// Serial link settings
#[derive(Clone, Debug, Deserialize)]
pub struct SerialConfig {
    /// Serial device path
    #[serde(default = "default_port")]
    pub port: String,

    /// Baud rate (default: 57600, the chassis' fixed rate)
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Response read timeout in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// Robot motion tuning
#[derive(Clone, Debug, Deserialize)]
pub struct RobotTuning {
    /// Drive rate in mm/s for route following
    #[serde(default = "default_drive_rate")]
    pub drive_rate_mm_s: i16,

    /// Physical edge length of one grid cell in millimeters
    #[serde(default = "default_cell_size")]
    pub cell_size_mm: i32,

    /// Sensor polling interval while driving (milliseconds).
    /// The chassis rejects sensor polls faster than 15 ms.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Sensor polling interval while idle (milliseconds)
    #[serde(default = "default_idle_poll_interval")]
    pub idle_poll_interval_ms: u64,

    /// Default per-route deadline in seconds
    #[serde(default = "default_route_timeout")]
    pub route_timeout_s: u64,
}

/// Grid map dimensions
#[derive(Clone, Debug, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_dim_x")]
    pub dim_x: i32,

    #[serde(default = "default_dim_y")]
    pub dim_y: i32,
}

// Default value functions
fn default_port() -> String {
    "/dev/ttyO1".to_string()
}
fn default_baud_rate() -> u32 {
    57600
}
fn default_read_timeout_ms() -> u64 {
    1250
}
fn default_drive_rate() -> i16 {
    100
}
fn default_cell_size() -> i32 {
    192
}
fn default_poll_interval() -> u64 {
    15
}
fn default_idle_poll_interval() -> u64 {
    1000
}
fn default_route_timeout() -> u64 {
    120
}
fn default_dim_x() -> i32 {
    16
}
fn default_dim_y() -> i32 {
    8
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for RobotTuning {
    fn default() -> Self {
        Self {
            drive_rate_mm_s: default_drive_rate(),
            cell_size_mm: default_cell_size(),
            poll_interval_ms: default_poll_interval(),
            idle_poll_interval_ms: default_idle_poll_interval(),
            route_timeout_s: default_route_timeout(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            dim_x: default_dim_x(),
            dim_y: default_dim_y(),
        }
    }
}

impl YatraConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::NavError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: YatraConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_chassis_constants() {
        let config = YatraConfig::default();
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.robot.drive_rate_mm_s, 100);
        assert_eq!(config.robot.cell_size_mm, 192);
        assert_eq!(config.robot.poll_interval_ms, 15);
        assert_eq!((config.grid.dim_x, config.grid.dim_y), (16, 8));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: YatraConfig = toml::from_str(
            r#"
            [serial]
            port = "/dev/ttyUSB0"

            [robot]
            drive_rate_mm_s = 150
            "#,
        )
        .unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.robot.drive_rate_mm_s, 150);
        assert_eq!(config.robot.cell_size_mm, 192);
        assert_eq!(config.grid.dim_x, 16);
    }
}

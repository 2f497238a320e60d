use serde::Deserialize;
use std::fs;

use crate::errors::{ConfigError, ConfigResult};
use crate::sensors::{SensorPosition, SensorToggleState};

/// Root configuration: an optional `[runtime]` table and `[[sensor]]` entries
#[derive(Debug, Deserialize)]
pub struct SensorConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(rename = "sensor", default)]
    pub sensors: Vec<SensorEntry>,
}

/// Control loop settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub tick_hz: u32,
    pub report_interval_secs: u64,
    /// Directory for persisted calibration blobs
    pub calibration_dir: String,
    /// Re-run setup on sensors found in ERROR at report time
    pub retry_errored: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_hz: 100,
            report_interval_secs: 10,
            calibration_dir: "calibration".to_string(),
            retry_errored: true,
        }
    }
}

/// One sensor entry, matching each `[[sensor]]` section
#[derive(Debug, Clone, Deserialize)]
pub struct SensorEntry {
    pub id: u8,
    pub driver: String,
    pub bus: String,
    pub address: u8,
    /// Mounting rotation about the tracker's Z axis, degrees
    #[serde(default)]
    pub rotation_deg: f32,
    #[serde(default)]
    pub position: SensorPosition,
    /// Auxiliary magnetometer on the same bus
    pub magnetometer_address: Option<u8>,
    #[serde(default)]
    pub toggles: SensorToggleState,
}

pub fn parse_sensor_config(content: &str) -> ConfigResult<SensorConfig> {
    let parsed: SensorConfig = toml::from_str(content)?;
    if parsed.runtime.tick_hz == 0 {
        return Err(ConfigError::InvalidValue {
            field: "runtime.tick_hz".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    if parsed.runtime.report_interval_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "runtime.report_interval_secs".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}

/// Loads config from TOML file
pub fn load_sensor_config(path: &str) -> ConfigResult<SensorConfig> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::LoadError {
        path: path.to_string(),
        source,
    })?;
    parse_sensor_config(&content)
}

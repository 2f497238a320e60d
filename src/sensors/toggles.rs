use serde::{Deserialize, Serialize};
use std::fmt;

/// Named per-sensor feature flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorToggle {
    MagEnabled,
    CalibrationEnabled,
    TempGradientCalibrationEnabled,
}

impl SensorToggle {
    pub const ALL: [SensorToggle; 3] = [
        SensorToggle::MagEnabled,
        SensorToggle::CalibrationEnabled,
        SensorToggle::TempGradientCalibrationEnabled,
    ];
}

impl fmt::Display for SensorToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SensorToggle::MagEnabled => "MagEnabled",
            SensorToggle::CalibrationEnabled => "CalibrationEnabled",
            SensorToggle::TempGradientCalibrationEnabled => "TempGradientCalibrationEnabled",
        };
        f.write_str(s)
    }
}

/// Stored toggle values.
///
/// Values are stored whether or not the owning sensor supports the toggle;
/// support is answered by the driver, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorToggleState {
    pub mag_enabled: bool,
    pub calibration_enabled: bool,
    pub temp_gradient_calibration_enabled: bool,
}

impl Default for SensorToggleState {
    fn default() -> Self {
        Self {
            mag_enabled: false,
            calibration_enabled: true,
            temp_gradient_calibration_enabled: true,
        }
    }
}

impl SensorToggleState {
    pub fn get(&self, toggle: SensorToggle) -> bool {
        match toggle {
            SensorToggle::MagEnabled => self.mag_enabled,
            SensorToggle::CalibrationEnabled => self.calibration_enabled,
            SensorToggle::TempGradientCalibrationEnabled => self.temp_gradient_calibration_enabled,
        }
    }

    /// Store a value. Returns true if it differs from the previous one.
    pub fn set(&mut self, toggle: SensorToggle, state: bool) -> bool {
        let slot = match toggle {
            SensorToggle::MagEnabled => &mut self.mag_enabled,
            SensorToggle::CalibrationEnabled => &mut self.calibration_enabled,
            SensorToggle::TempGradientCalibrationEnabled => {
                &mut self.temp_gradient_calibration_enabled
            }
        };
        let changed = *slot != state;
        *slot = state;
        changed
    }
}

/// One toggle as seen by a configuration UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleBits {
    pub enabled: bool,
    pub supported: bool,
}

/// Snapshot of every toggle and whether the sensor honours it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorConfigBits {
    pub mag_enabled: ToggleBits,
    pub calibration_enabled: ToggleBits,
    pub temp_gradient_calibration_enabled: ToggleBits,
}

impl SensorConfigBits {
    pub fn new(toggles: &SensorToggleState, supported: impl Fn(SensorToggle) -> bool) -> Self {
        let bits = |toggle| ToggleBits {
            enabled: toggles.get(toggle),
            supported: supported(toggle),
        };
        Self {
            mag_enabled: bits(SensorToggle::MagEnabled),
            calibration_enabled: bits(SensorToggle::CalibrationEnabled),
            temp_gradient_calibration_enabled: bits(SensorToggle::TempGradientCalibrationEnabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let toggles = SensorToggleState::default();
        assert!(!toggles.get(SensorToggle::MagEnabled));
        assert!(toggles.get(SensorToggle::CalibrationEnabled));
        assert!(toggles.get(SensorToggle::TempGradientCalibrationEnabled));
    }

    #[test]
    fn test_set_reports_change() {
        let mut toggles = SensorToggleState::default();
        assert!(toggles.set(SensorToggle::MagEnabled, true));
        assert!(!toggles.set(SensorToggle::MagEnabled, true));
        assert!(toggles.get(SensorToggle::MagEnabled));
        // other flags untouched
        assert!(toggles.get(SensorToggle::CalibrationEnabled));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let toggles: SensorToggleState = toml::from_str("mag_enabled = true").unwrap();
        assert!(toggles.mag_enabled);
        assert!(toggles.calibration_enabled);
    }

    #[test]
    fn test_config_bits() {
        let toggles = SensorToggleState::default();
        let bits = SensorConfigBits::new(&toggles, |t| t == SensorToggle::CalibrationEnabled);
        assert_eq!(bits.mag_enabled, ToggleBits { enabled: false, supported: false });
        assert_eq!(bits.calibration_enabled, ToggleBits { enabled: true, supported: true });
        assert!(!bits.temp_gradient_calibration_enabled.supported);
    }
}

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ConfigResult;

/// Calibration routine requested through `start_calibration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationKind {
    /// Stationary gyro-bias estimation
    Rest,
    /// Learn gyro bias as a function of die temperature
    TemperatureDrift,
    Magnetometer,
    Other(u8),
}

impl From<u8> for CalibrationKind {
    fn from(code: u8) -> Self {
        match code {
            0 => CalibrationKind::Rest,
            1 => CalibrationKind::TemperatureDrift,
            2 => CalibrationKind::Magnetometer,
            other => CalibrationKind::Other(other),
        }
    }
}

impl fmt::Display for CalibrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationKind::Rest => f.write_str("rest"),
            CalibrationKind::TemperatureDrift => f.write_str("temperature drift"),
            CalibrationKind::Magnetometer => f.write_str("magnetometer"),
            CalibrationKind::Other(code) => write!(f, "type {}", code),
        }
    }
}

/// Averages gyro samples taken while the device is still
#[derive(Debug, Clone)]
pub struct GyroBiasEstimator {
    target: u32,
    samples: u32,
    sum: Vector3<f32>,
}

impl GyroBiasEstimator {
    pub fn new(target: u32) -> Self {
        Self {
            target: target.max(1),
            samples: 0,
            sum: Vector3::zeros(),
        }
    }

    /// Feed one sample. Returns the bias once `target` samples are in.
    pub fn push(&mut self, gyro: Vector3<f32>) -> Option<Vector3<f32>> {
        self.sum += gyro;
        self.samples += 1;
        (self.samples >= self.target).then(|| self.sum / self.samples as f32)
    }

    pub fn progress(&self) -> (u32, u32) {
        (self.samples, self.target)
    }
}

pub const TEMP_MIN_C: f32 = 15.0;
pub const TEMP_STEP_C: f32 = 0.5;
pub const TEMP_BUCKETS: usize = 60;
/// Samples a bucket needs before its bias is trusted
pub const MIN_BUCKET_SAMPLES: u32 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureBucket {
    pub samples: u32,
    pub bias: [f32; 3],
}

/// Gyro bias learned per half-degree temperature bucket.
///
/// Serialized to JSON for the calibration store; the store treats it as an
/// opaque blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureCalibration {
    buckets: Vec<TemperatureBucket>,
}

impl Default for TemperatureCalibration {
    fn default() -> Self {
        Self {
            buckets: vec![TemperatureBucket::default(); TEMP_BUCKETS],
        }
    }
}

impl TemperatureCalibration {
    fn bucket_index(temp_c: f32) -> Option<usize> {
        if !temp_c.is_finite() || temp_c < TEMP_MIN_C {
            return None;
        }
        let index = ((temp_c - TEMP_MIN_C) / TEMP_STEP_C) as usize;
        (index < TEMP_BUCKETS).then_some(index)
    }

    /// Fold a still-device gyro sample into the bucket for `temp_c`.
    /// Returns false if the temperature is out of range.
    pub fn learn(&mut self, temp_c: f32, gyro: Vector3<f32>) -> bool {
        let Some(index) = Self::bucket_index(temp_c) else {
            return false;
        };
        let bucket = &mut self.buckets[index];
        bucket.samples = bucket.samples.saturating_add(1);
        let n = bucket.samples as f32;
        for axis in 0..3 {
            bucket.bias[axis] += (gyro[axis] - bucket.bias[axis]) / n;
        }
        true
    }

    /// Bias for `temp_c`, if that bucket has enough samples
    pub fn bias_at(&self, temp_c: f32) -> Option<Vector3<f32>> {
        let bucket = &self.buckets[Self::bucket_index(temp_c)?];
        (bucket.samples >= MIN_BUCKET_SAMPLES).then(|| Vector3::from(bucket.bias))
    }

    /// (usable buckets, total buckets)
    pub fn coverage(&self) -> (usize, usize) {
        let filled = self
            .buckets
            .iter()
            .filter(|b| b.samples >= MIN_BUCKET_SAMPLES)
            .count();
        (filled, self.buckets.len())
    }

    /// Bucket temperature range paired with its contents
    pub fn buckets(&self) -> impl Iterator<Item = (f32, &TemperatureBucket)> {
        self.buckets
            .iter()
            .enumerate()
            .map(|(i, b)| (TEMP_MIN_C + i as f32 * TEMP_STEP_C, b))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_blob(&self) -> ConfigResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_blob(blob: &[u8]) -> ConfigResult<Self> {
        let mut table: Self = serde_json::from_slice(blob)?;
        table.buckets.resize(TEMP_BUCKETS, TemperatureBucket::default());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(CalibrationKind::from(0), CalibrationKind::Rest);
        assert_eq!(CalibrationKind::from(1), CalibrationKind::TemperatureDrift);
        assert_eq!(CalibrationKind::from(7), CalibrationKind::Other(7));
        assert_eq!(CalibrationKind::Other(7).to_string(), "type 7");
    }

    #[test]
    fn test_bias_estimator_mean() {
        let mut est = GyroBiasEstimator::new(4);
        assert!(est.push(Vector3::new(0.1, 0.0, -0.2)).is_none());
        assert!(est.push(Vector3::new(0.3, 0.0, -0.2)).is_none());
        assert!(est.push(Vector3::new(0.1, 0.4, -0.2)).is_none());
        let bias = est.push(Vector3::new(0.3, 0.0, -0.2)).unwrap();
        assert!((bias.x - 0.2).abs() < 1e-6);
        assert!((bias.y - 0.1).abs() < 1e-6);
        assert!((bias.z + 0.2).abs() < 1e-6);
        assert_eq!(est.progress(), (4, 4));
    }

    #[test]
    fn test_temperature_learning_needs_enough_samples() {
        let mut table = TemperatureCalibration::default();
        let gyro = Vector3::new(0.01, -0.02, 0.03);
        for _ in 0..MIN_BUCKET_SAMPLES - 1 {
            assert!(table.learn(30.2, gyro));
        }
        assert!(table.bias_at(30.2).is_none());

        table.learn(30.2, gyro);
        let bias = table.bias_at(30.4).unwrap();
        assert!((bias - gyro).norm() < 1e-5);
        // neighbouring bucket is still empty
        assert!(table.bias_at(30.6).is_none());
        assert_eq!(table.coverage(), (1, TEMP_BUCKETS));
    }

    #[test]
    fn test_out_of_range_temperatures_are_ignored() {
        let mut table = TemperatureCalibration::default();
        assert!(!table.learn(10.0, Vector3::zeros()));
        assert!(!table.learn(80.0, Vector3::zeros()));
        assert!(!table.learn(f32::NAN, Vector3::zeros()));
        assert_eq!(table.coverage().0, 0);
    }

    #[test]
    fn test_blob_restores_table() {
        let mut table = TemperatureCalibration::default();
        for _ in 0..MIN_BUCKET_SAMPLES {
            table.learn(25.0, Vector3::new(0.5, 0.0, 0.0));
        }
        let restored = TemperatureCalibration::from_blob(&table.to_blob().unwrap()).unwrap();
        assert_eq!(restored, table);

        table.reset();
        assert_eq!(table.coverage().0, 0);
        assert!(TemperatureCalibration::from_blob(b"not json").is_err());
    }
}

use nalgebra::Vector3;
use std::f32::consts::PI;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::base::SensorCore;
use super::calibration::{CalibrationKind, GyroBiasEstimator, TemperatureCalibration};
use super::fusion::{FusionEngine, GyroIntegrator, ImuSample, STANDARD_GRAVITY};
use super::toggles::SensorToggle;
use super::types::SensorTypeId;
use super::{DriverContext, SensorDriver, SensorFactory};
use crate::config::CalibrationStore;
use crate::errors::{SensorError, SensorResult};

// Register addresses for the ICM42688P (bank 0)
const DEVICE_CONFIG: u8 = 0x11;
const TEMP_DATA1: u8 = 0x1D;
const PWR_MGMT0: u8 = 0x4E;
const GYRO_CONFIG0: u8 = 0x4F;
const ACCEL_CONFIG0: u8 = 0x50;
const WHO_AM_I: u8 = 0x75;
const REG_BANK_SEL: u8 = 0x76;

// Expected WHO_AM_I values
pub const WHOAMI_ICM42688P: u8 = 0x47;
pub const WHOAMI_ICM42688: u8 = 0x44;

const ACCEL_SENSITIVITY_2G: f32 = 16384.0; // LSB/g
const GYRO_SENSITIVITY_250DPS: f32 = 131.0; // LSB/dps
const TEMP_SENSITIVITY: f32 = 132.48; // LSB/°C
const TEMP_OFFSET: f32 = 25.0; // °C

const RESET_DELAY: Duration = Duration::from_millis(20);

pub const REST_CALIBRATION_SAMPLES: u32 = 100;
const STILL_GYRO_RAD_S: f32 = 0.05;
const STILL_ACCEL_M_S2: f32 = 0.5;

pub struct Icm42688p {
    fusion: Box<dyn FusionEngine>,
    store: Arc<dyn CalibrationStore>,
    temperature_calibration: TemperatureCalibration,
    learning_temperature: bool,
    gyro_bias: Vector3<f32>,
    rest_calibration: Option<GyroBiasEstimator>,
    last_temperature: Option<f32>,
    last_sample: Option<Instant>,
}

impl Icm42688p {
    pub fn new(fusion: Box<dyn FusionEngine>, store: Arc<dyn CalibrationStore>) -> Self {
        Self {
            fusion,
            store,
            temperature_calibration: TemperatureCalibration::default(),
            learning_temperature: false,
            gyro_bias: Vector3::zeros(),
            rest_calibration: None,
            last_temperature: None,
            last_sample: None,
        }
    }

    pub fn temperature_calibration(&self) -> &TemperatureCalibration {
        &self.temperature_calibration
    }

    pub fn last_temperature(&self) -> Option<f32> {
        self.last_temperature
    }

    fn start_rest_calibration(&mut self, core: &mut SensorCore) {
        info!("Rest calibration started, keep the tracker still");
        core.mark_rest_calibration_complete(false);
        self.rest_calibration = Some(GyroBiasEstimator::new(REST_CALIBRATION_SAMPLES));
    }

    fn load_temperature_calibration(&mut self, sensor_id: u8) {
        self.temperature_calibration = match self.store.load(sensor_id) {
            Ok(Some(blob)) => match TemperatureCalibration::from_blob(&blob) {
                Ok(table) => {
                    let (filled, total) = table.coverage();
                    info!("Loaded temperature calibration, {}/{} buckets", filled, total);
                    table
                }
                Err(e) => {
                    warn!("Stored temperature calibration unreadable, starting fresh: {}", e);
                    TemperatureCalibration::default()
                }
            },
            Ok(None) => {
                debug!("No stored temperature calibration");
                TemperatureCalibration::default()
            }
            Err(e) => {
                warn!("Failed to load temperature calibration: {}", e);
                TemperatureCalibration::default()
            }
        };
    }

    /// Bias to subtract at the current temperature
    fn current_bias(&self, core: &SensorCore, temperature: f32) -> Vector3<f32> {
        if core.toggles().temp_gradient_calibration_enabled {
            if let Some(bias) = self.temperature_calibration.bias_at(temperature) {
                return bias;
            }
        }
        self.gyro_bias
    }

    /// Temperature, accel and gyro in one big-endian burst from TEMP_DATA1
    fn read_sample(&self, core: &SensorCore) -> SensorResult<ImuSample> {
        let mut buf = [0u8; 14];
        core.registers()
            .read_regs(TEMP_DATA1, &mut buf)
            .map_err(|e| SensorError::ReadError {
                sensor: core.logger().tag(),
                reason: format!("Failed to read sample: {}", e),
            })?;

        let word = |i: usize| i16::from_be_bytes([buf[i], buf[i + 1]]) as f32;
        let accel_scale = STANDARD_GRAVITY / ACCEL_SENSITIVITY_2G;
        let gyro_scale = PI / 180.0 / GYRO_SENSITIVITY_250DPS;
        Ok(ImuSample {
            temperature: Some(word(0) / TEMP_SENSITIVITY + TEMP_OFFSET),
            accel: Vector3::new(word(2), word(4), word(6)) * accel_scale,
            gyro: Vector3::new(word(8), word(10), word(12)) * gyro_scale,
        })
    }

    fn configure(core: &SensorCore, reg: u8, value: u8, what: &str) -> SensorResult<()> {
        core.registers()
            .write_reg(reg, value)
            .map_err(|e| SensorError::InitError {
                sensor: core.logger().tag(),
                reason: format!("Failed to {}: {}", what, e),
            })
    }
}

impl SensorDriver for Icm42688p {
    fn motion_setup(&mut self, core: &mut SensorCore) -> SensorResult<()> {
        Self::configure(core, REG_BANK_SEL, 0x00, "select bank 0")?;

        let who_am_i = core.registers().read_reg(WHO_AM_I)?;
        if who_am_i != WHOAMI_ICM42688P && who_am_i != WHOAMI_ICM42688 {
            return Err(SensorError::WrongChipId {
                sensor: core.logger().tag(),
                expected: WHOAMI_ICM42688P,
                actual: who_am_i,
            });
        }

        Self::configure(core, DEVICE_CONFIG, 0x01, "reset device")?;
        // Bounded datasheet wait; blocks the caller, including setup retries
        // from the control loop.
        thread::sleep(RESET_DELAY);

        // Gyro and accel in low noise mode
        Self::configure(core, PWR_MGMT0, 0x0F, "configure power management")?;
        // Gyro: 250 dps, 1 kHz
        Self::configure(core, GYRO_CONFIG0, 0x66, "configure gyroscope")?;
        // Accel: 2g, 1 kHz
        Self::configure(core, ACCEL_CONFIG0, 0x66, "configure accelerometer")?;

        self.load_temperature_calibration(core.sensor_id());
        self.last_sample = None;
        Ok(())
    }

    fn post_setup(&mut self, core: &mut SensorCore) {
        if core.toggles().calibration_enabled && !core.has_completed_rest_calibration() {
            self.start_rest_calibration(core);
        }
    }

    fn motion_loop(&mut self, core: &mut SensorCore) -> SensorResult<()> {
        let sample = self.read_sample(core)?;
        core.record_sample();

        let now = Instant::now();
        let dt = self
            .last_sample
            .replace(now)
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);

        let temperature = sample.temperature.unwrap_or(TEMP_OFFSET);
        self.last_temperature = Some(temperature);
        let still = sample.is_still(STILL_GYRO_RAD_S, STILL_ACCEL_M_S2);

        if let Some(estimator) = self.rest_calibration.as_mut() {
            if still {
                if let Some(bias) = estimator.push(sample.gyro) {
                    self.gyro_bias = bias;
                    self.rest_calibration = None;
                    core.set_calibration_accuracy(3);
                    core.mark_rest_calibration_complete(true);
                    info!("Gyro bias: {:.5} {:.5} {:.5} rad/s", bias.x, bias.y, bias.z);
                }
            }
        }

        if self.learning_temperature
            && still
            && core.toggles().temp_gradient_calibration_enabled
        {
            self.temperature_calibration.learn(temperature, sample.gyro);
        }

        let corrected = ImuSample {
            gyro: sample.gyro - self.current_bias(core, temperature),
            ..sample
        };
        self.fusion.update(&corrected, dt);

        let offset = *core.sensor_offset();
        core.set_fused_rotation(offset * self.fusion.orientation());
        core.set_acceleration(offset * self.fusion.linear_acceleration());
        core.mark_had_data();

        if core.is_faulted() {
            core.clear_fault();
            info!("Communication restored");
        }
        Ok(())
    }

    fn start_calibration(&mut self, core: &mut SensorCore, kind: CalibrationKind) {
        match kind {
            CalibrationKind::Rest => self.start_rest_calibration(core),
            CalibrationKind::TemperatureDrift => {
                if !core.toggles().temp_gradient_calibration_enabled {
                    warn!("Temperature calibration requested but disabled by toggle");
                    return;
                }
                self.learning_temperature = true;
                info!("Temperature calibration started, samples are collected while still");
            }
            other => warn!("Calibration ({}) not supported for IMU {}", other, core.sensor_type()),
        }
    }

    fn print_temperature_calibration_state(&self, _core: &SensorCore) {
        let (filled, total) = self.temperature_calibration.coverage();
        info!(
            "Temperature calibration: {}/{} buckets, learning {}, last temperature {:?}",
            filled, total, self.learning_temperature, self.last_temperature
        );
    }

    fn print_debug_temperature_calibration_state(&self, core: &SensorCore) {
        self.print_temperature_calibration_state(core);
        for (temp, bucket) in self.temperature_calibration.buckets() {
            if bucket.samples > 0 {
                info!(
                    "{:5.1}°C: {:4} samples, bias {:.5} {:.5} {:.5}",
                    temp, bucket.samples, bucket.bias[0], bucket.bias[1], bucket.bias[2]
                );
            }
        }
    }

    fn reset_temperature_calibration_state(&mut self, core: &mut SensorCore) {
        self.temperature_calibration.reset();
        self.learning_temperature = false;
        match self.store.erase(core.sensor_id()) {
            Ok(()) => info!("Temperature calibration reset"),
            Err(e) => error!("Failed to erase stored temperature calibration: {}", e),
        }
    }

    fn save_temperature_calibration(&mut self, core: &mut SensorCore) {
        let result = self
            .temperature_calibration
            .to_blob()
            .and_then(|blob| self.store.save(core.sensor_id(), &blob));
        match result {
            Ok(()) => {
                let (filled, total) = self.temperature_calibration.coverage();
                info!("Temperature calibration saved, {}/{} buckets", filled, total);
            }
            Err(e) => error!("Failed to save temperature calibration: {}", e),
        }
    }

    fn is_flag_supported(&self, toggle: SensorToggle) -> bool {
        match toggle {
            SensorToggle::MagEnabled => false,
            SensorToggle::CalibrationEnabled => true,
            SensorToggle::TempGradientCalibrationEnabled => true,
        }
    }

    fn on_toggle_changed(&mut self, core: &mut SensorCore, toggle: SensorToggle, state: bool) {
        match toggle {
            SensorToggle::CalibrationEnabled => {
                if state && !core.has_completed_rest_calibration() {
                    self.start_rest_calibration(core);
                } else if !state && self.rest_calibration.take().is_some() {
                    info!("Rest calibration cancelled");
                }
            }
            SensorToggle::TempGradientCalibrationEnabled => {
                if !state && self.learning_temperature {
                    self.learning_temperature = false;
                    info!("Temperature calibration stopped");
                }
            }
            SensorToggle::MagEnabled => {}
        }
    }
}

pub static ICM42688P_FACTORY: Icm42688pFactory = Icm42688pFactory;

pub struct Icm42688pFactory;

impl SensorFactory for Icm42688pFactory {
    fn name(&self) -> &'static str {
        "icm42688p"
    }

    fn sensor_type(&self) -> SensorTypeId {
        SensorTypeId::Icm42688
    }

    fn create(&self, ctx: &DriverContext) -> Box<dyn SensorDriver> {
        Box::new(Icm42688p::new(
            Box::new(GyroIntegrator::default()),
            ctx.calibration_store.clone(),
        ))
    }
}

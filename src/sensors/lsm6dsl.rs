use nalgebra::Vector3;
use std::f32::consts::PI;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::base::SensorCore;
use super::calibration::{CalibrationKind, GyroBiasEstimator};
use super::fusion::{FusionEngine, GyroIntegrator, ImuSample, STANDARD_GRAVITY};
use super::lis3mdl::Lis3mdl;
use super::toggles::SensorToggle;
use super::types::SensorTypeId;
use super::{DriverContext, SensorDriver, SensorFactory};
use crate::bus::RegisterInterface;
use crate::errors::{SensorError, SensorResult};

// Register addresses for the LSM6DSL
const WHO_AM_I: u8 = 0x0F;
const CTRL1_XL: u8 = 0x10;
const CTRL2_G: u8 = 0x11;
const CTRL3_C: u8 = 0x12;
const OUT_TEMP_L: u8 = 0x20;

pub const WHOAMI_LSM6DSL: u8 = 0x6A;

const ACCEL_SENSITIVITY_2G: f32 = 0.061 * STANDARD_GRAVITY / 1000.0; // m/s^2 per LSB
const GYRO_SENSITIVITY_250DPS: f32 = 8.75 / 1000.0 * PI / 180.0; // rad/s per LSB

pub const REST_CALIBRATION_SAMPLES: u32 = 100;
const STILL_GYRO_RAD_S: f32 = 0.05;
const STILL_ACCEL_M_S2: f32 = 0.5;

pub struct Lsm6dsl {
    fusion: Box<dyn FusionEngine>,
    magnetometer: Option<Lis3mdl>,
    /// Set by a successful magnetometer init during setup
    mag_ready: bool,
    gyro_bias: Vector3<f32>,
    rest_calibration: Option<GyroBiasEstimator>,
    last_sample: Option<Instant>,
}

impl Lsm6dsl {
    pub fn new(fusion: Box<dyn FusionEngine>) -> Self {
        Self {
            fusion,
            magnetometer: None,
            mag_ready: false,
            gyro_bias: Vector3::zeros(),
            rest_calibration: None,
            last_sample: None,
        }
    }

    pub fn with_magnetometer(mut self, registers: Option<Arc<dyn RegisterInterface>>) -> Self {
        self.magnetometer = registers.map(Lis3mdl::new);
        self
    }

    fn ready_magnetometer(&self) -> Option<&Lis3mdl> {
        self.magnetometer.as_ref().filter(|_| self.mag_ready)
    }

    pub fn gyro_bias(&self) -> &Vector3<f32> {
        &self.gyro_bias
    }

    fn start_rest_calibration(&mut self, core: &mut SensorCore) {
        info!("Rest calibration started, keep the tracker still");
        core.mark_rest_calibration_complete(false);
        self.rest_calibration = Some(GyroBiasEstimator::new(REST_CALIBRATION_SAMPLES));
    }

    /// Temperature, gyro and accel in one burst starting at OUT_TEMP_L
    fn read_sample(&self, core: &SensorCore) -> SensorResult<ImuSample> {
        let mut buf = [0u8; 14];
        core.registers()
            .read_regs(OUT_TEMP_L, &mut buf)
            .map_err(|e| SensorError::ReadError {
                sensor: core.logger().tag(),
                reason: format!("Failed to read sample: {}", e),
            })?;

        let word = |i: usize| i16::from_le_bytes([buf[i], buf[i + 1]]) as f32;
        Ok(ImuSample {
            temperature: Some(word(0) / 256.0 + 25.0),
            gyro: Vector3::new(word(2), word(4), word(6)) * GYRO_SENSITIVITY_250DPS,
            accel: Vector3::new(word(8), word(10), word(12)) * ACCEL_SENSITIVITY_2G,
        })
    }

    fn configure(core: &SensorCore, reg: u8, value: u8) -> SensorResult<()> {
        core.registers()
            .write_reg(reg, value)
            .map_err(|e| SensorError::InitError {
                sensor: core.logger().tag(),
                reason: format!("Failed to configure {:#04x}: {}", reg, e),
            })
    }
}

impl SensorDriver for Lsm6dsl {
    fn motion_setup(&mut self, core: &mut SensorCore) -> SensorResult<()> {
        let who_am_i = core.registers().read_reg(WHO_AM_I)?;
        if who_am_i != WHOAMI_LSM6DSL {
            return Err(SensorError::WrongChipId {
                sensor: core.logger().tag(),
                expected: WHOAMI_LSM6DSL,
                actual: who_am_i,
            });
        }

        // Block data update, register auto-increment
        Self::configure(core, CTRL3_C, 0b0100_0100)?;
        // Accelerometer: 104 Hz, 2g
        Self::configure(core, CTRL1_XL, 0b0100_0000)?;
        // Gyroscope: 104 Hz, 250 dps
        Self::configure(core, CTRL2_G, 0b0100_0000)?;

        self.mag_ready = false;
        if let Some(mag) = &self.magnetometer {
            let owner = core.logger().tag();
            let result = if core.toggles().mag_enabled {
                mag.init(&owner)
            } else {
                mag.init(&owner).and_then(|_| mag.sleep())
            };
            match result {
                Ok(()) => self.mag_ready = true,
                Err(e) => warn!("{} not usable, continuing without it: {}", Lis3mdl::NAME, e),
            }
        }

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

        if let Some(estimator) = self.rest_calibration.as_mut() {
            if sample.is_still(STILL_GYRO_RAD_S, STILL_ACCEL_M_S2) {
                if let Some(bias) = estimator.push(sample.gyro) {
                    self.gyro_bias = bias;
                    self.rest_calibration = None;
                    core.set_calibration_accuracy(3);
                    core.mark_rest_calibration_complete(true);
                    info!("Gyro bias: {:.5} {:.5} {:.5} rad/s", bias.x, bias.y, bias.z);
                }
            }
        }

        let corrected = ImuSample {
            gyro: sample.gyro - self.gyro_bias,
            ..sample
        };
        self.fusion.update(&corrected, dt);

        if core.toggles().mag_enabled {
            let field = self
                .ready_magnetometer()
                .map(|mag| mag.read(&core.logger().tag()))
                .transpose()?;
            if let Some(field) = field {
                self.fusion.update_mag(&field);
            }
        }

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
            other => warn!("Calibration ({}) not supported for IMU {}", other, core.sensor_type()),
        }
    }

    fn is_flag_supported(&self, toggle: SensorToggle) -> bool {
        match toggle {
            SensorToggle::MagEnabled => self.mag_ready,
            SensorToggle::CalibrationEnabled => true,
            SensorToggle::TempGradientCalibrationEnabled => false,
        }
    }

    fn on_toggle_changed(&mut self, core: &mut SensorCore, toggle: SensorToggle, state: bool) {
        match toggle {
            SensorToggle::MagEnabled => {
                let Some(mag) = self.ready_magnetometer() else { return };
                let result = if state {
                    mag.wake(&core.logger().tag())
                } else {
                    mag.sleep()
                };
                match result {
                    Ok(()) => info!("Magnetometer {}", if state { "enabled" } else { "disabled" }),
                    Err(e) => warn!("Failed to switch magnetometer: {}", e),
                }
            }
            SensorToggle::CalibrationEnabled => {
                if state && !core.has_completed_rest_calibration() {
                    self.start_rest_calibration(core);
                } else if !state && self.rest_calibration.take().is_some() {
                    info!("Rest calibration cancelled");
                }
            }
            SensorToggle::TempGradientCalibrationEnabled => {}
        }
    }

    fn attached_magnetometer(&self) -> Option<&'static str> {
        self.ready_magnetometer().map(|_| Lis3mdl::NAME)
    }
}

pub static LSM6DSL_FACTORY: Lsm6dslFactory = Lsm6dslFactory;

pub struct Lsm6dslFactory;

impl SensorFactory for Lsm6dslFactory {
    fn name(&self) -> &'static str {
        "lsm6dsl"
    }

    fn sensor_type(&self) -> SensorTypeId {
        SensorTypeId::Lsm6dsl
    }

    fn create(&self, ctx: &DriverContext) -> Box<dyn SensorDriver> {
        Box::new(
            Lsm6dsl::new(Box::new(GyroIntegrator::default()))
                .with_magnetometer(ctx.magnetometer.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::{MockHardware, MockRegisters};
    use crate::bus::HardwareBinding;
    use crate::sensors::lis3mdl::WHOAMI_LIS3MDL;
    use crate::sensors::{Sensor, SensorStatus};
    use crate::transport::RecordingTransport;
    use nalgebra::UnitQuaternion;
    use std::f32::consts::FRAC_PI_2;

    const OUTX_L_G: u8 = 0x22;
    const OUTX_L_XL: u8 = 0x28;
    const ONE_G_RAW: i16 = 16393;

    fn words(values: [i16; 3]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn chip() -> Arc<MockRegisters> {
        let regs = Arc::new(MockRegisters::new(0x6A));
        regs.set(WHO_AM_I, WHOAMI_LSM6DSL);
        regs.set_block(OUTX_L_G, &words([0, 0, 0]));
        regs.set_block(OUTX_L_XL, &words([0, 0, ONE_G_RAW]));
        regs
    }

    fn sensor_on(regs: Arc<MockRegisters>, rotation: f32, driver: Lsm6dsl) -> Sensor {
        let core = SensorCore::new(
            "LSM6DSL",
            SensorTypeId::Lsm6dsl,
            0,
            regs,
            rotation,
            HardwareBinding::Bound(Arc::new(MockHardware::new("i2c1"))),
        );
        Sensor::new(core, Box::new(driver))
    }

    fn driver() -> Lsm6dsl {
        Lsm6dsl::new(Box::new(GyroIntegrator::default()))
    }

    #[test]
    fn test_setup_configures_chip() {
        let regs = chip();
        let mut sensor = sensor_on(regs.clone(), 0.0, driver());
        sensor.motion_setup();

        assert_eq!(sensor.sensor_state(), SensorStatus::Ok);
        assert_eq!(
            regs.writes(),
            vec![(CTRL3_C, 0b0100_0100), (CTRL1_XL, 0b0100_0000), (CTRL2_G, 0b0100_0000)]
        );
    }

    #[test]
    fn test_wrong_chip_stays_offline() {
        let regs = chip();
        regs.set(WHO_AM_I, 0x47);
        let mut sensor = sensor_on(regs.clone(), 0.0, driver());
        sensor.motion_setup();

        assert!(!sensor.is_working());
        assert_eq!(sensor.sensor_state(), SensorStatus::Offline);
        assert!(regs.writes().is_empty());
    }

    #[test]
    fn test_loop_publishes_offset_rotation() {
        let mut sensor = sensor_on(chip(), FRAC_PI_2, driver());
        sensor.motion_setup();
        sensor.motion_loop();

        assert!(sensor.had_data());
        assert!(sensor.has_new_data_to_send());
        // still device: fusion stays at identity, only the mounting offset remains
        let offset = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        assert!(sensor.fused_rotation().angle_to(&offset) < 1e-4);
        assert!(sensor.acceleration().norm() < 0.05);

        let mut transport = RecordingTransport::default();
        sensor.send_data(&mut transport);
        assert_eq!(transport.rotations.len(), 1);
        assert_eq!(transport.accelerations.len(), 1);
    }

    #[test]
    fn test_rest_calibration_learns_bias() {
        let regs = chip();
        regs.set_block(OUTX_L_G, &words([50, -30, 10]));
        let mut sensor = sensor_on(regs, 0.0, driver());
        sensor.motion_setup();
        sensor.post_setup();

        for _ in 0..REST_CALIBRATION_SAMPLES - 1 {
            sensor.motion_loop();
        }
        assert!(!sensor.has_completed_rest_calibration());
        sensor.motion_loop();
        assert!(sensor.has_completed_rest_calibration());
        assert_eq!(sensor.core().calibration_accuracy(), 3);

        // explicit recalibration clears the flag until done again
        sensor.start_calibration(CalibrationKind::Rest);
        assert!(!sensor.has_completed_rest_calibration());
    }

    #[test]
    fn test_calibration_toggle_off_skips_rest_calibration() {
        let mut sensor = sensor_on(chip(), 0.0, driver());
        sensor.set_flag(SensorToggle::CalibrationEnabled, false);
        sensor.motion_setup();
        sensor.post_setup();
        for _ in 0..REST_CALIBRATION_SAMPLES {
            sensor.motion_loop();
        }
        assert!(!sensor.has_completed_rest_calibration());
    }

    #[test]
    fn test_bus_fault_and_recovery() {
        let regs = chip();
        let mut sensor = sensor_on(regs.clone(), 0.0, driver());
        sensor.motion_setup();
        sensor.motion_loop();
        let last = *sensor.fused_rotation();

        regs.set_failing(true);
        sensor.motion_loop();
        assert_eq!(sensor.sensor_state(), SensorStatus::Error);
        assert_eq!(*sensor.fused_rotation(), last);

        regs.set_failing(false);
        sensor.motion_loop();
        assert_eq!(sensor.sensor_state(), SensorStatus::Ok);
    }

    #[test]
    fn test_magnetometer_support_follows_attachment() {
        let plain = sensor_on(chip(), 0.0, driver());
        assert!(!plain.is_flag_supported(SensorToggle::MagEnabled));
        assert_eq!(plain.attached_magnetometer(), None);

        let mag_regs = Arc::new(MockRegisters::new(0x1C));
        mag_regs.set(0x0F, WHOAMI_LIS3MDL);
        let mut with_mag = sensor_on(
            chip(),
            0.0,
            driver().with_magnetometer(Some(mag_regs.clone() as Arc<dyn RegisterInterface>)),
        );
        with_mag.set_flag(SensorToggle::MagEnabled, true);
        with_mag.motion_setup();
        assert!(with_mag.is_flag_supported(SensorToggle::MagEnabled));
        assert_eq!(with_mag.attached_magnetometer(), Some("LIS3MDL"));

        let reads = mag_regs.read_count();
        with_mag.motion_loop();
        assert!(mag_regs.read_count() > reads);
    }

    #[test]
    fn test_broken_magnetometer_comes_back_after_retry() {
        let mag_regs = Arc::new(MockRegisters::new(0x1C));
        let mut sensor = sensor_on(
            chip(),
            0.0,
            driver().with_magnetometer(Some(mag_regs.clone() as Arc<dyn RegisterInterface>)),
        );
        sensor.motion_setup();
        assert!(sensor.is_working());
        assert!(!sensor.is_flag_supported(SensorToggle::MagEnabled));
        assert_eq!(sensor.attached_magnetometer(), None);

        // chip answers on the next setup attempt
        mag_regs.set(0x0F, WHOAMI_LIS3MDL);
        sensor.reset();
        sensor.motion_setup();
        assert!(sensor.is_flag_supported(SensorToggle::MagEnabled));
        assert_eq!(sensor.attached_magnetometer(), Some("LIS3MDL"));
    }

    #[test]
    fn test_mag_toggle_before_setup_writes_nothing() {
        let mag_regs = Arc::new(MockRegisters::new(0x1C));
        mag_regs.set(0x0F, WHOAMI_LIS3MDL);
        let regs = chip();
        let mut sensor = sensor_on(
            regs.clone(),
            0.0,
            driver().with_magnetometer(Some(mag_regs.clone() as Arc<dyn RegisterInterface>)),
        );
        sensor.set_flag(SensorToggle::MagEnabled, true);
        assert!(mag_regs.writes().is_empty());
        assert!(regs.writes().is_empty());

        sensor.motion_setup();
        let after_setup = mag_regs.writes().len();
        assert!(after_setup > 0);

        // working now: switching off puts the magnetometer to sleep
        sensor.set_flag(SensorToggle::MagEnabled, false);
        assert_eq!(mag_regs.writes().len(), after_setup + 1);
    }
}

pub mod calibration;
pub mod base;
pub mod empty;
pub mod fusion;
pub mod lis3mdl;
pub mod rate;
pub mod status;
pub mod toggles;
pub mod types;

#[cfg(feature = "lsm6dsl")]
pub mod lsm6dsl;
#[cfg(feature = "icm42688p")]
pub mod icm42688p;

use nalgebra::{UnitQuaternion, Vector3};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::bus::RegisterInterface;
use crate::config::CalibrationStore;
use crate::errors::{SensorError, SensorResult};
use crate::transport::DataTransport;

pub use self::calibration::CalibrationKind;
pub use self::base::SensorCore;
pub use self::status::SensorStatus;
pub use self::toggles::{SensorConfigBits, SensorToggle, SensorToggleState};
pub use self::types::{SensorDataType, SensorPosition, SensorTypeId};

/// Contract every chip family implements.
///
/// Hooks run with the sensor's log span entered and receive the shared state
/// by exclusive reference. Errors returned from `motion_setup` and
/// `motion_loop` are reduced to a status by [`Sensor`]; they never reach
/// callers of the entity.
pub trait SensorDriver: Send {
    /// One-time hardware init. Return Ok only once the chip is verified.
    fn motion_setup(&mut self, core: &mut SensorCore) -> SensorResult<()>;

    fn post_setup(&mut self, _core: &mut SensorCore) {}

    /// Read the chip, run fusion, publish through the core setters.
    fn motion_loop(&mut self, _core: &mut SensorCore) -> SensorResult<()> {
        Ok(())
    }

    fn start_calibration(&mut self, core: &mut SensorCore, kind: CalibrationKind) {
        warn!(
            "Calibration ({}) not supported for IMU {}",
            kind,
            core.sensor_type()
        );
    }

    fn print_temperature_calibration_state(&self, core: &SensorCore) {
        temperature_calibration_unsupported(core);
    }

    fn print_debug_temperature_calibration_state(&self, core: &SensorCore) {
        temperature_calibration_unsupported(core);
    }

    fn reset_temperature_calibration_state(&mut self, core: &mut SensorCore) {
        temperature_calibration_unsupported(core);
    }

    fn save_temperature_calibration(&mut self, core: &mut SensorCore) {
        temperature_calibration_unsupported(core);
    }

    /// Whether `toggle` has any effect on this chip
    fn is_flag_supported(&self, _toggle: SensorToggle) -> bool {
        false
    }

    /// Called after a supported toggle changed value
    fn on_toggle_changed(&mut self, _core: &mut SensorCore, _toggle: SensorToggle, _state: bool) {}

    fn attached_magnetometer(&self) -> Option<&'static str> {
        None
    }

    fn data_type(&self) -> SensorDataType {
        SensorDataType::Rotation
    }

    fn sensor_state(&self, core: &SensorCore) -> SensorStatus {
        core.status()
    }
}

fn temperature_calibration_unsupported(core: &SensorCore) {
    warn!(
        "Temperature calibration not supported for IMU {}",
        core.sensor_type()
    );
}

/// A sensor: base state plus the chip-specific driver.
pub struct Sensor {
    core: SensorCore,
    driver: Box<dyn SensorDriver>,
}

impl fmt::Debug for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sensor")
            .field("id", &self.core.sensor_id())
            .field("type", &self.core.sensor_type())
            .field("address", &self.core.address())
            .field("hardware", self.core.hardware())
            .field("status", &self.sensor_state())
            .finish()
    }
}

/// Diagnostic snapshot of one sensor
#[derive(Debug, Clone, Serialize)]
pub struct SensorReport {
    pub id: u8,
    pub sensor_type: &'static str,
    pub address: u8,
    pub position: SensorPosition,
    pub status: SensorStatus,
    pub working: bool,
    pub had_data: bool,
    pub rest_calibrated: bool,
    pub calibration_accuracy: u8,
    pub tps: f32,
    pub data_rate: f32,
    pub magnetometer: Option<&'static str>,
    pub config: SensorConfigBits,
}

impl Sensor {
    pub fn new(core: SensorCore, driver: Box<dyn SensorDriver>) -> Self {
        Self { core, driver }
    }

    /// Read-only view of the base state
    pub fn core(&self) -> &SensorCore {
        &self.core
    }

    fn with_driver<R>(&mut self, f: impl FnOnce(&mut dyn SensorDriver, &mut SensorCore) -> R) -> R {
        let span = self.core.logger().span().clone();
        let _entered = span.enter();
        f(self.driver.as_mut(), &mut self.core)
    }

    pub fn motion_setup(&mut self) {
        self.with_driver(|driver, core| {
            let Some(hw) = core.hardware().interface().cloned() else {
                warn!("No hardware bound, sensor stays offline");
                return;
            };
            hw.swap_in();

            let snapshot = core.motion_snapshot();
            match driver.motion_setup(core) {
                Ok(()) => {
                    core.clear_fault();
                    core.set_working(true);
                    info!(
                        "{} initialized at {:#04x} on {}",
                        core.sensor_type(),
                        core.address(),
                        hw.describe()
                    );
                }
                Err(e) => {
                    core.restore_motion(snapshot);
                    core.set_working(false);
                    error!("Setup failed: {}", e);
                }
            }
        });
    }

    pub fn post_setup(&mut self) {
        if !self.core.is_working() {
            return;
        }
        self.with_driver(|driver, core| driver.post_setup(core));
    }

    pub fn motion_loop(&mut self) {
        if !self.core.is_working() {
            return;
        }
        self.with_driver(|driver, core| {
            if let Some(hw) = core.hardware().interface() {
                hw.swap_in();
            }
            if let Err(e) = driver.motion_loop(core) {
                if core.is_faulted() {
                    debug!("Still failing: {}", e);
                } else {
                    error!("Read failed, sensor marked as errored: {}", e);
                }
                core.mark_fault();
            }
        });
    }

    /// Hand dirty state to `transport`. Does nothing if nothing changed.
    pub fn send_data(&mut self, transport: &mut dyn DataTransport) {
        let span = self.core.logger().span().clone();
        let _entered = span.enter();
        self.core.send_data(transport);
    }

    /// Back to OFFLINE. Setup must be run again.
    pub fn reset(&mut self) {
        self.with_driver(|_, core| {
            core.reset_status();
            info!("Sensor reset, now offline");
        });
    }

    pub fn start_calibration(&mut self, kind: impl Into<CalibrationKind>) {
        let kind = kind.into();
        self.with_driver(|driver, core| driver.start_calibration(core, kind));
    }

    pub fn print_temperature_calibration_state(&self) {
        let _entered = self.core.logger().span().enter();
        self.driver.print_temperature_calibration_state(&self.core);
    }

    pub fn print_debug_temperature_calibration_state(&self) {
        let _entered = self.core.logger().span().enter();
        self.driver.print_debug_temperature_calibration_state(&self.core);
    }

    pub fn reset_temperature_calibration_state(&mut self) {
        self.with_driver(|driver, core| driver.reset_temperature_calibration_state(core));
    }

    pub fn save_temperature_calibration(&mut self) {
        self.with_driver(|driver, core| driver.save_temperature_calibration(core));
    }

    /// Store a toggle. Only supported toggles on a working sensor reach the
    /// driver; setup picks up stored values on its own.
    pub fn set_flag(&mut self, toggle: SensorToggle, state: bool) {
        let changed = self.core.toggles_mut().set(toggle, state);
        if !self.driver.is_flag_supported(toggle) {
            let _entered = self.core.logger().span().enter();
            debug!("{} not supported, value stored only", toggle);
            return;
        }
        if changed && self.core.is_working() {
            self.with_driver(|driver, core| driver.on_toggle_changed(core, toggle, state));
        }
    }

    pub fn is_flag_supported(&self, toggle: SensorToggle) -> bool {
        self.driver.is_flag_supported(toggle)
    }

    pub fn sensor_config_data(&self) -> SensorConfigBits {
        SensorConfigBits::new(self.core.toggles(), |t| self.driver.is_flag_supported(t))
    }

    pub fn set_sensor_info(&mut self, position: SensorPosition) {
        self.core.set_position(position);
    }

    /// Always OFFLINE when unbound. Never OK for a non-working sensor,
    /// whatever the driver says.
    pub fn sensor_state(&self) -> SensorStatus {
        if !self.core.is_valid() {
            return SensorStatus::Offline;
        }
        match self.driver.sensor_state(&self.core) {
            SensorStatus::Ok if !(self.core.is_valid() && self.core.is_working()) => {
                SensorStatus::Offline
            }
            status => status,
        }
    }

    pub fn is_working(&self) -> bool {
        self.core.is_working()
    }

    pub fn had_data(&self) -> bool {
        self.core.had_data()
    }

    pub fn is_valid(&self) -> bool {
        self.core.is_valid()
    }

    pub fn sensor_id(&self) -> u8 {
        self.core.sensor_id()
    }

    pub fn sensor_type(&self) -> SensorTypeId {
        self.core.sensor_type()
    }

    pub fn sensor_position(&self) -> SensorPosition {
        self.core.position()
    }

    pub fn fused_rotation(&self) -> &UnitQuaternion<f32> {
        self.core.fused_rotation()
    }

    pub fn last_fused_rotation_sent(&self) -> &UnitQuaternion<f32> {
        self.core.last_fused_rotation_sent()
    }

    pub fn acceleration(&self) -> &Vector3<f32> {
        self.core.acceleration()
    }

    pub fn has_new_data_to_send(&self) -> bool {
        self.core.has_new_data_to_send()
    }

    pub fn has_completed_rest_calibration(&self) -> bool {
        self.core.has_completed_rest_calibration()
    }

    pub fn attached_magnetometer(&self) -> Option<&'static str> {
        self.driver.attached_magnetometer()
    }

    pub fn data_type(&self) -> SensorDataType {
        self.driver.data_type()
    }

    /// Raw samples per second
    pub fn tps_rate(&mut self) -> f32 {
        self.core.tps_counter_mut().rate()
    }

    /// Emissions per second
    pub fn data_rate(&mut self) -> f32 {
        self.core.data_counter_mut().rate()
    }

    pub fn report(&mut self) -> SensorReport {
        SensorReport {
            id: self.sensor_id(),
            sensor_type: self.sensor_type().name(),
            address: self.core.address(),
            position: self.sensor_position(),
            status: self.sensor_state(),
            working: self.is_working(),
            had_data: self.had_data(),
            rest_calibrated: self.has_completed_rest_calibration(),
            calibration_accuracy: self.core.calibration_accuracy(),
            tps: self.tps_rate(),
            data_rate: self.data_rate(),
            magnetometer: self.attached_magnetometer(),
            config: self.sensor_config_data(),
        }
    }
}

/// Collaborators a factory may hand to the driver it builds
#[derive(Clone)]
pub struct DriverContext {
    /// Auxiliary magnetometer on the same bus, if configured
    pub magnetometer: Option<Arc<dyn RegisterInterface>>,
    pub calibration_store: Arc<dyn CalibrationStore>,
}

pub trait SensorFactory: Sync {
    /// Driver key used in configuration
    fn name(&self) -> &'static str;
    fn sensor_type(&self) -> SensorTypeId;
    fn create(&self, ctx: &DriverContext) -> Box<dyn SensorDriver>;
}

pub use self::empty::EMPTY_FACTORY;
#[cfg(feature = "icm42688p")]
pub use self::icm42688p::ICM42688P_FACTORY;
#[cfg(feature = "lsm6dsl")]
pub use self::lsm6dsl::LSM6DSL_FACTORY;

pub static SENSOR_FACTORIES: &[&dyn SensorFactory] = &[
    &EMPTY_FACTORY,
    #[cfg(feature = "lsm6dsl")]
    &LSM6DSL_FACTORY,
    #[cfg(feature = "icm42688p")]
    &ICM42688P_FACTORY,
];

pub fn find_factory(driver: &str) -> SensorResult<&'static dyn SensorFactory> {
    SENSOR_FACTORIES
        .iter()
        .copied()
        .find(|f| f.name() == driver)
        .ok_or_else(|| SensorError::UnsupportedDriver {
            driver: driver.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::{MockHardware, MockRegisters};
    use crate::bus::HardwareBinding;
    use crate::transport::RecordingTransport;
    use std::f32::consts::FRAC_PI_2;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Script {
        setup_ok: bool,
        setup_calls: usize,
        loop_calls: usize,
        fail_reads: bool,
        rotation: Option<UnitQuaternion<f32>>,
        acceleration: Option<Vector3<f32>>,
        rest_calibration: Option<bool>,
        toggle_changes: Vec<(SensorToggle, bool)>,
    }

    /// Driver whose behaviour is set from the test through a shared script
    struct ScriptedDriver {
        script: Arc<Mutex<Script>>,
        supported: Vec<SensorToggle>,
    }

    impl SensorDriver for ScriptedDriver {
        fn motion_setup(&mut self, core: &mut SensorCore) -> SensorResult<()> {
            let mut script = self.script.lock().unwrap();
            script.setup_calls += 1;
            if script.setup_ok {
                return Ok(());
            }
            // touches state before failing, to check it gets rolled back
            core.set_fused_rotation(UnitQuaternion::from_euler_angles(0.3, 0.0, 0.0));
            core.set_acceleration(Vector3::new(1.0, 2.0, 3.0));
            Err(SensorError::NotResponding { sensor: core.logger().tag() })
        }

        fn motion_loop(&mut self, core: &mut SensorCore) -> SensorResult<()> {
            let mut script = self.script.lock().unwrap();
            script.loop_calls += 1;
            if script.fail_reads {
                return Err(SensorError::ReadError {
                    sensor: core.logger().tag(),
                    reason: "scripted".to_string(),
                });
            }
            if core.is_faulted() {
                core.clear_fault();
            }
            if let Some(q) = script.rotation.take() {
                core.set_fused_rotation(q);
            }
            if let Some(a) = script.acceleration.take() {
                core.set_acceleration(a);
            }
            if let Some(done) = script.rest_calibration.take() {
                core.mark_rest_calibration_complete(done);
            }
            core.record_sample();
            core.mark_had_data();
            Ok(())
        }

        fn is_flag_supported(&self, toggle: SensorToggle) -> bool {
            self.supported.contains(&toggle)
        }

        fn on_toggle_changed(&mut self, _core: &mut SensorCore, toggle: SensorToggle, state: bool) {
            self.script.lock().unwrap().toggle_changes.push((toggle, state));
        }
    }

    fn scripted_sensor(
        binding: HardwareBinding,
        rotation: f32,
        supported: Vec<SensorToggle>,
    ) -> (Sensor, Arc<Mutex<Script>>) {
        let script = Arc::new(Mutex::new(Script {
            setup_ok: true,
            ..Default::default()
        }));
        let core = SensorCore::new(
            "SCRIPTED",
            SensorTypeId::Unknown,
            0,
            Arc::new(MockRegisters::new(0x68)),
            rotation,
            binding,
        );
        let driver = ScriptedDriver {
            script: script.clone(),
            supported,
        };
        (Sensor::new(core, Box::new(driver)), script)
    }

    fn bound() -> HardwareBinding {
        HardwareBinding::Bound(Arc::new(MockHardware::new("bus0")))
    }

    fn working_sensor() -> (Sensor, Arc<Mutex<Script>>) {
        let (mut sensor, script) = scripted_sensor(bound(), 0.0, vec![]);
        sensor.motion_setup();
        assert!(sensor.is_working());
        (sensor, script)
    }

    #[test]
    fn test_unbound_sensor_never_reports_ok() {
        let (mut sensor, script) = scripted_sensor(HardwareBinding::Unbound, 0.0, vec![]);
        sensor.motion_setup();
        sensor.post_setup();
        sensor.motion_loop();

        assert!(!sensor.is_valid());
        assert!(!sensor.is_working());
        assert_eq!(sensor.sensor_state(), SensorStatus::Offline);
        let script = script.lock().unwrap();
        assert_eq!(script.setup_calls, 0);
        assert_eq!(script.loop_calls, 0);
    }

    #[test]
    fn test_setup_success_goes_online() {
        let hw = Arc::new(MockHardware::new("bus0"));
        let (mut sensor, _) = scripted_sensor(HardwareBinding::Bound(hw.clone()), 0.0, vec![]);
        assert_eq!(sensor.sensor_state(), SensorStatus::Offline);

        sensor.motion_setup();
        assert_eq!(sensor.sensor_state(), SensorStatus::Ok);
        assert_eq!(hw.swap_count(), 1);
        assert!(!sensor.had_data());
    }

    #[test]
    fn test_setup_failure_leaves_state_untouched() {
        let (mut sensor, script) = scripted_sensor(bound(), 0.0, vec![]);
        script.lock().unwrap().setup_ok = false;

        sensor.motion_setup();
        assert!(!sensor.is_working());
        assert_eq!(sensor.sensor_state(), SensorStatus::Offline);
        assert_eq!(*sensor.fused_rotation(), UnitQuaternion::identity());
        assert_eq!(*sensor.acceleration(), Vector3::zeros());
        assert!(!sensor.has_new_data_to_send());

        // loop is not driven while offline
        sensor.motion_loop();
        assert_eq!(script.lock().unwrap().loop_calls, 0);
    }

    #[test]
    fn test_new_data_tracks_setters() {
        let (mut sensor, script) = working_sensor();
        assert!(!sensor.has_new_data_to_send());

        sensor.motion_loop();
        assert!(!sensor.has_new_data_to_send());

        script.lock().unwrap().acceleration = Some(Vector3::new(1.0, 0.0, 0.0));
        sensor.motion_loop();
        assert!(sensor.has_new_data_to_send());

        let mut transport = RecordingTransport::default();
        sensor.send_data(&mut transport);
        assert!(!sensor.has_new_data_to_send());

        script.lock().unwrap().rotation = Some(UnitQuaternion::identity());
        sensor.motion_loop();
        assert!(sensor.has_new_data_to_send());
    }

    #[test]
    fn test_send_data_flushes_and_counts_once() {
        let (mut sensor, script) = working_sensor();
        let q = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        {
            let mut script = script.lock().unwrap();
            script.rotation = Some(q);
            script.acceleration = Some(Vector3::new(0.0, 0.0, 1.5));
        }
        sensor.motion_loop();
        let events_before = sensor.core().data_counter().events();

        let mut transport = RecordingTransport::default();
        sensor.send_data(&mut transport);

        assert!(!sensor.has_new_data_to_send());
        assert_eq!(*sensor.last_fused_rotation_sent(), q);
        assert_eq!(sensor.core().data_counter().events(), events_before + 1);
        assert_eq!(transport.rotations, vec![(0, q, 0)]);
        assert_eq!(transport.accelerations, vec![(0, Vector3::new(0.0, 0.0, 1.5))]);
    }

    #[test]
    fn test_send_without_new_data_is_noop() {
        let (mut sensor, _) = working_sensor();
        let mut transport = RecordingTransport::default();
        let events = sensor.core().data_counter().events();
        let last_sent = *sensor.last_fused_rotation_sent();

        for _ in 0..3 {
            sensor.send_data(&mut transport);
        }
        assert_eq!(sensor.core().data_counter().events(), events);
        assert_eq!(*sensor.last_fused_rotation_sent(), last_sent);
        assert!(transport.rotations.is_empty());
        assert!(transport.accelerations.is_empty());
    }

    #[test]
    fn test_unsupported_toggle_is_stored_but_inert() {
        let (mut sensor, script) =
            scripted_sensor(bound(), 0.0, vec![SensorToggle::CalibrationEnabled]);
        sensor.motion_setup();

        sensor.set_flag(SensorToggle::MagEnabled, true);
        assert!(!sensor.is_flag_supported(SensorToggle::MagEnabled));
        assert!(sensor.core().toggles().get(SensorToggle::MagEnabled));
        assert!(script.lock().unwrap().toggle_changes.is_empty());

        sensor.set_flag(SensorToggle::CalibrationEnabled, false);
        assert_eq!(
            script.lock().unwrap().toggle_changes,
            vec![(SensorToggle::CalibrationEnabled, false)]
        );

        let bits = sensor.sensor_config_data();
        assert!(bits.mag_enabled.enabled);
        assert!(!bits.mag_enabled.supported);
        assert!(bits.calibration_enabled.supported);
    }

    #[test]
    fn test_toggle_before_setup_is_stored_without_hook() {
        let (mut sensor, script) =
            scripted_sensor(bound(), 0.0, vec![SensorToggle::CalibrationEnabled]);

        sensor.set_flag(SensorToggle::CalibrationEnabled, false);
        assert!(!sensor.core().toggles().calibration_enabled);
        assert!(script.lock().unwrap().toggle_changes.is_empty());

        sensor.motion_setup();
        sensor.set_flag(SensorToggle::CalibrationEnabled, true);
        assert_eq!(
            script.lock().unwrap().toggle_changes,
            vec![(SensorToggle::CalibrationEnabled, true)]
        );
    }

    #[test]
    fn test_debug_names_sensor() {
        let (sensor, _) = scripted_sensor(HardwareBinding::Unbound, 0.0, vec![]);
        let text = format!("{:?}", sensor);
        assert!(text.contains("id: 0"));
        assert!(text.contains("Unbound"));
        assert!(text.contains("Offline"));
    }

    #[test]
    fn test_rest_calibration_reflects_latest_call() {
        // Resettable: a later `false` clears an earlier `true`.
        let (mut sensor, script) = working_sensor();
        script.lock().unwrap().rest_calibration = Some(true);
        sensor.motion_loop();
        assert!(sensor.has_completed_rest_calibration());

        script.lock().unwrap().rest_calibration = Some(false);
        sensor.motion_loop();
        assert!(!sensor.has_completed_rest_calibration());
    }

    #[test]
    fn test_offset_is_not_applied_by_getter() {
        let (mut sensor, script) = scripted_sensor(bound(), FRAC_PI_2, vec![]);
        sensor.motion_setup();
        script.lock().unwrap().rotation = Some(UnitQuaternion::identity());
        sensor.motion_loop();

        assert_eq!(*sensor.fused_rotation(), UnitQuaternion::identity());
        let offset = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        assert!(sensor.core().sensor_offset().angle_to(&offset) < 1e-6);
    }

    #[test]
    fn test_read_failure_keeps_last_state_and_recovers() {
        let (mut sensor, script) = working_sensor();
        let q = UnitQuaternion::from_euler_angles(0.0, 0.5, 0.0);
        script.lock().unwrap().rotation = Some(q);
        sensor.motion_loop();

        script.lock().unwrap().fail_reads = true;
        sensor.motion_loop();
        sensor.motion_loop();
        assert_eq!(sensor.sensor_state(), SensorStatus::Error);
        assert!(sensor.is_working());
        assert_eq!(*sensor.fused_rotation(), q);

        script.lock().unwrap().fail_reads = false;
        sensor.motion_loop();
        assert_eq!(sensor.sensor_state(), SensorStatus::Ok);
    }

    #[test]
    fn test_reset_returns_to_offline() {
        let (mut sensor, _) = working_sensor();
        sensor.motion_loop();
        assert!(sensor.had_data());

        sensor.reset();
        assert_eq!(sensor.sensor_state(), SensorStatus::Offline);
        assert!(!sensor.had_data());

        sensor.motion_setup();
        assert_eq!(sensor.sensor_state(), SensorStatus::Ok);
    }

    #[test]
    fn test_unsupported_calibration_hooks_are_noops() {
        let (mut sensor, _) = working_sensor();
        sensor.start_calibration(CalibrationKind::TemperatureDrift);
        sensor.start_calibration(5u8);
        sensor.print_temperature_calibration_state();
        sensor.print_debug_temperature_calibration_state();
        sensor.reset_temperature_calibration_state();
        sensor.save_temperature_calibration();

        assert_eq!(sensor.sensor_state(), SensorStatus::Ok);
        assert!(!sensor.has_new_data_to_send());
    }

    #[test]
    fn test_report_snapshot() {
        let (mut sensor, _) = working_sensor();
        sensor.set_sensor_info(SensorPosition::LeftFoot);
        let report = sensor.report();
        assert_eq!(report.id, 0);
        assert_eq!(report.address, 0x68);
        assert_eq!(report.position, SensorPosition::LeftFoot);
        assert_eq!(report.status, SensorStatus::Ok);
        assert_eq!(report.magnetometer, None);
        assert_eq!(sensor.data_type(), SensorDataType::Rotation);
    }

    #[test]
    fn test_factory_lookup() {
        assert!(find_factory("empty").is_ok());
        assert!(matches!(
            find_factory("bmp388"),
            Err(SensorError::UnsupportedDriver { .. })
        ));
    }
}

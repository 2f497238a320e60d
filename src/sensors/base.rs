use nalgebra::{UnitQuaternion, Vector3};
use std::sync::Arc;
use tracing::{debug, info};

use super::rate::RateCounter;
use super::status::SensorStatus;
use super::toggles::SensorToggleState;
use super::types::{SensorPosition, SensorTypeId};
use crate::bus::{HardwareBinding, RegisterInterface};
use crate::logging::SensorLogger;
use crate::transport::DataTransport;

/// State shared by every sensor variant.
///
/// Drivers receive it by `&mut` inside their hooks and change it only through
/// the methods below; outside a hook the entity hands out `&SensorCore` only.
pub struct SensorCore {
    registers: Arc<dyn RegisterInterface>,
    hardware: HardwareBinding,
    address: u8,
    sensor_id: u8,
    sensor_type: SensorTypeId,
    /// Aligns the mounting axes with the tracker's axes
    /// (Y to the top of the tracker, Z to the front, X to the left).
    sensor_offset: UnitQuaternion<f32>,

    working: bool,
    had_data: bool,
    faulted: bool,
    calibration_accuracy: u8,
    rest_calibration_complete: bool,

    new_fused_rotation: bool,
    fused_rotation: UnitQuaternion<f32>,
    last_fused_rotation_sent: UnitQuaternion<f32>,

    new_acceleration: bool,
    acceleration: Vector3<f32>,

    position: SensorPosition,
    toggles: SensorToggleState,

    tps_counter: RateCounter,
    data_counter: RateCounter,
    logger: SensorLogger,
}

/// Fused and acceleration state, captured so a failed setup can be undone
#[derive(Debug, Clone, Copy)]
pub(crate) struct MotionSnapshot {
    fused_rotation: UnitQuaternion<f32>,
    new_fused_rotation: bool,
    acceleration: Vector3<f32>,
    new_acceleration: bool,
}

impl SensorCore {
    /// `rotation` is the mounting angle about +Z, in radians.
    pub fn new(
        name: &'static str,
        sensor_type: SensorTypeId,
        sensor_id: u8,
        registers: Arc<dyn RegisterInterface>,
        rotation: f32,
        hardware: HardwareBinding,
    ) -> Self {
        let address = registers.address();
        Self {
            registers,
            hardware,
            address,
            sensor_id,
            sensor_type,
            sensor_offset: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), rotation),
            working: false,
            had_data: false,
            faulted: false,
            calibration_accuracy: 0,
            rest_calibration_complete: false,
            new_fused_rotation: false,
            fused_rotation: UnitQuaternion::identity(),
            last_fused_rotation_sent: UnitQuaternion::identity(),
            new_acceleration: false,
            acceleration: Vector3::zeros(),
            position: SensorPosition::None,
            toggles: SensorToggleState::default(),
            tps_counter: RateCounter::new(),
            data_counter: RateCounter::new(),
            logger: SensorLogger::new(name, sensor_id),
        }
    }

    pub fn registers(&self) -> &Arc<dyn RegisterInterface> {
        &self.registers
    }

    pub fn hardware(&self) -> &HardwareBinding {
        &self.hardware
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn sensor_id(&self) -> u8 {
        self.sensor_id
    }

    pub fn sensor_type(&self) -> SensorTypeId {
        self.sensor_type
    }

    pub fn sensor_offset(&self) -> &UnitQuaternion<f32> {
        &self.sensor_offset
    }

    pub fn logger(&self) -> &SensorLogger {
        &self.logger
    }

    pub fn is_valid(&self) -> bool {
        self.hardware.is_bound()
    }

    pub fn is_working(&self) -> bool {
        self.working
    }

    pub fn had_data(&self) -> bool {
        self.had_data
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn calibration_accuracy(&self) -> u8 {
        self.calibration_accuracy
    }

    pub fn has_completed_rest_calibration(&self) -> bool {
        self.rest_calibration_complete
    }

    pub fn fused_rotation(&self) -> &UnitQuaternion<f32> {
        &self.fused_rotation
    }

    pub fn last_fused_rotation_sent(&self) -> &UnitQuaternion<f32> {
        &self.last_fused_rotation_sent
    }

    pub fn acceleration(&self) -> &Vector3<f32> {
        &self.acceleration
    }

    pub fn has_new_data_to_send(&self) -> bool {
        self.new_fused_rotation || self.new_acceleration
    }

    pub fn position(&self) -> SensorPosition {
        self.position
    }

    pub fn toggles(&self) -> &SensorToggleState {
        &self.toggles
    }

    pub fn status(&self) -> SensorStatus {
        SensorStatus::derive(self.is_valid(), self.working, self.faulted)
    }

    pub fn tps_counter(&self) -> &RateCounter {
        &self.tps_counter
    }

    pub fn data_counter(&self) -> &RateCounter {
        &self.data_counter
    }

    // Mutators available to drivers.

    pub fn set_fused_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.fused_rotation = rotation;
        self.new_fused_rotation = true;
    }

    pub fn set_acceleration(&mut self, acceleration: Vector3<f32>) {
        self.acceleration = acceleration;
        self.new_acceleration = true;
    }

    pub fn set_calibration_accuracy(&mut self, accuracy: u8) {
        self.calibration_accuracy = accuracy;
    }

    pub fn mark_had_data(&mut self) {
        self.had_data = true;
    }

    /// Count one raw sample on the acquisition counter
    pub fn record_sample(&mut self) {
        self.tps_counter.update();
    }

    /// Flag a communication failure. Only meaningful while working.
    pub fn mark_fault(&mut self) {
        if self.working {
            self.faulted = true;
        }
    }

    /// Variant recovery: return an errored sensor to OK
    pub fn clear_fault(&mut self) {
        self.faulted = false;
    }

    pub fn mark_rest_calibration_complete(&mut self, completed: bool) {
        if self.rest_calibration_complete != completed {
            info!(
                "Rest calibration {}",
                if completed { "completed" } else { "cleared" }
            );
        }
        self.rest_calibration_complete = completed;
    }

    // Entity-only mutators.

    pub(crate) fn set_working(&mut self, working: bool) {
        self.working = working && self.is_valid();
    }

    pub(crate) fn reset_status(&mut self) {
        self.working = false;
        self.faulted = false;
        self.had_data = false;
    }

    pub(crate) fn set_position(&mut self, position: SensorPosition) {
        self.position = position;
    }

    pub(crate) fn toggles_mut(&mut self) -> &mut SensorToggleState {
        &mut self.toggles
    }

    pub(crate) fn tps_counter_mut(&mut self) -> &mut RateCounter {
        &mut self.tps_counter
    }

    pub(crate) fn data_counter_mut(&mut self) -> &mut RateCounter {
        &mut self.data_counter
    }

    pub(crate) fn motion_snapshot(&self) -> MotionSnapshot {
        MotionSnapshot {
            fused_rotation: self.fused_rotation,
            new_fused_rotation: self.new_fused_rotation,
            acceleration: self.acceleration,
            new_acceleration: self.new_acceleration,
        }
    }

    pub(crate) fn restore_motion(&mut self, snapshot: MotionSnapshot) {
        self.fused_rotation = snapshot.fused_rotation;
        self.new_fused_rotation = snapshot.new_fused_rotation;
        self.acceleration = snapshot.acceleration;
        self.new_acceleration = snapshot.new_acceleration;
    }

    /// Flush dirty state to the transport. No-op when nothing changed.
    pub(crate) fn send_data(&mut self, transport: &mut dyn DataTransport) {
        if !self.has_new_data_to_send() {
            return;
        }

        if self.new_fused_rotation {
            transport.send_rotation(self.sensor_id, &self.fused_rotation, self.calibration_accuracy);
            self.new_fused_rotation = false;
        }
        if self.new_acceleration {
            transport.send_acceleration(self.sensor_id, &self.acceleration);
            self.new_acceleration = false;
        }

        self.last_fused_rotation_sent = self.fused_rotation;
        self.data_counter.update();
        debug!("Sent data, {} events total", self.data_counter.events());
    }
}

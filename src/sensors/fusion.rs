use nalgebra::{UnitQuaternion, Vector3};

pub const STANDARD_GRAVITY: f32 = 9.80665;

/// One raw reading, already scaled to SI units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// m/s², sensor frame
    pub accel: Vector3<f32>,
    /// rad/s, sensor frame
    pub gyro: Vector3<f32>,
    /// °C, if the chip reports it
    pub temperature: Option<f32>,
}

impl ImuSample {
    /// Gyro below `gyro_threshold` rad/s and accel within `accel_tolerance`
    /// m/s² of 1 g.
    pub fn is_still(&self, gyro_threshold: f32, accel_tolerance: f32) -> bool {
        self.gyro.norm() < gyro_threshold
            && (self.accel.norm() - STANDARD_GRAVITY).abs() < accel_tolerance
    }
}

/// Orientation estimator fed by a driver's `motion_loop`.
///
/// Drivers own one of these and never implement the math themselves.
pub trait FusionEngine: Send {
    fn update(&mut self, sample: &ImuSample, dt: f32);

    fn update_mag(&mut self, _mag: &Vector3<f32>) {}

    /// Orientation in the sensor's own frame
    fn orientation(&self) -> UnitQuaternion<f32>;

    /// Acceleration with gravity removed, sensor frame
    fn linear_acceleration(&self) -> Vector3<f32>;
}

/// Integrates the gyro only. Stand-in for a real fusion engine.
#[derive(Debug, Clone)]
pub struct GyroIntegrator {
    orientation: UnitQuaternion<f32>,
    linear_accel: Vector3<f32>,
}

impl Default for GyroIntegrator {
    fn default() -> Self {
        Self {
            orientation: UnitQuaternion::identity(),
            linear_accel: Vector3::zeros(),
        }
    }
}

impl FusionEngine for GyroIntegrator {
    fn update(&mut self, sample: &ImuSample, dt: f32) {
        if dt > 0.0 {
            let delta = UnitQuaternion::from_scaled_axis(sample.gyro * dt);
            self.orientation = self.orientation * delta;
        }
        let gravity = self
            .orientation
            .inverse_transform_vector(&Vector3::new(0.0, 0.0, STANDARD_GRAVITY));
        self.linear_accel = sample.accel - gravity;
    }

    fn orientation(&self) -> UnitQuaternion<f32> {
        self.orientation
    }

    fn linear_acceleration(&self) -> Vector3<f32> {
        self.linear_accel
    }
}

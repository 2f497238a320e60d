use tracing::error;

use super::base::SensorCore;
use super::status::SensorStatus;
use super::types::SensorTypeId;
use super::{DriverContext, SensorDriver, SensorFactory};
use crate::errors::{SensorError, SensorResult};

/// Placeholder for a configured slot with nothing plugged in
pub struct EmptySensor;

impl SensorDriver for EmptySensor {
    fn motion_setup(&mut self, core: &mut SensorCore) -> SensorResult<()> {
        Err(SensorError::NotResponding {
            sensor: core.logger().tag(),
        })
    }
}

/// Placeholder for a sensor that was detected but could not be driven
pub struct ErroneousSensor {
    detected: SensorTypeId,
}

impl ErroneousSensor {
    pub fn new(detected: SensorTypeId) -> Self {
        Self { detected }
    }
}

impl SensorDriver for ErroneousSensor {
    fn motion_setup(&mut self, core: &mut SensorCore) -> SensorResult<()> {
        error!(
            "IMU of type {} failed to initialize at {:#04x}",
            self.detected,
            core.address()
        );
        Err(SensorError::NotResponding {
            sensor: core.logger().tag(),
        })
    }

    fn sensor_state(&self, _core: &SensorCore) -> SensorStatus {
        SensorStatus::Error
    }
}

pub static EMPTY_FACTORY: EmptyFactory = EmptyFactory;

pub struct EmptyFactory;

impl SensorFactory for EmptyFactory {
    fn name(&self) -> &'static str {
        "empty"
    }

    fn sensor_type(&self) -> SensorTypeId {
        SensorTypeId::Empty
    }

    fn create(&self, _ctx: &DriverContext) -> Box<dyn SensorDriver> {
        Box::new(EmptySensor)
    }
}

pub mod i2c;
pub mod mock;

use crate::errors::{SensorError, SensorResult};
use std::fmt;
use std::sync::Arc;

/// Bus type enum for the interfaces a sensor can sit behind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    I2C,
}

impl BusType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i2c" => Some(BusType::I2C),
            _ => None,
        }
    }
}

/// Register-level access to one device on a bus.
///
/// Owned by the bus registry and shared with the sensor bound to it. Reads
/// auto-increment from `reg` for multi-byte buffers.
pub trait RegisterInterface: Send + Sync {
    fn address(&self) -> u8;

    fn read_regs(&self, reg: u8, buf: &mut [u8]) -> SensorResult<()>;

    fn write_reg(&self, reg: u8, value: u8) -> SensorResult<()>;

    fn read_reg(&self, reg: u8) -> SensorResult<u8> {
        let mut buf = [0u8; 1];
        self.read_regs(reg, &mut buf)?;
        Ok(buf[0])
    }
}

/// Register interface for a slot with no device behind it
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyRegisterInterface;

impl RegisterInterface for EmptyRegisterInterface {
    fn address(&self) -> u8 {
        0
    }

    fn read_regs(&self, _reg: u8, _buf: &mut [u8]) -> SensorResult<()> {
        Err(SensorError::BusError {
            address: 0,
            reason: "no device bound".to_string(),
        })
    }

    fn write_reg(&self, _reg: u8, _value: u8) -> SensorResult<()> {
        Err(SensorError::BusError {
            address: 0,
            reason: "no device bound".to_string(),
        })
    }
}

/// Physical attachment of a sensor (a bus, a mux channel, ...)
pub trait HardwareInterface: Send + Sync {
    /// Bring the attachment up. Returns false if it is unusable.
    fn init(&self) -> bool;

    /// Route the shared bus to this attachment before talking to the device.
    fn swap_in(&self);

    fn describe(&self) -> String;
}

/// Whether a sensor has a physical attachment at all
#[derive(Clone, Default)]
pub enum HardwareBinding {
    Bound(Arc<dyn HardwareInterface>),
    #[default]
    Unbound,
}

impl HardwareBinding {
    pub fn is_bound(&self) -> bool {
        matches!(self, HardwareBinding::Bound(_))
    }

    pub fn interface(&self) -> Option<&Arc<dyn HardwareInterface>> {
        match self {
            HardwareBinding::Bound(hw) => Some(hw),
            HardwareBinding::Unbound => None,
        }
    }
}

impl From<Option<Arc<dyn HardwareInterface>>> for HardwareBinding {
    fn from(hw: Option<Arc<dyn HardwareInterface>>) -> Self {
        match hw {
            Some(hw) => HardwareBinding::Bound(hw),
            None => HardwareBinding::Unbound,
        }
    }
}

impl fmt::Debug for HardwareBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareBinding::Bound(hw) => write!(f, "Bound({})", hw.describe()),
            HardwareBinding::Unbound => write!(f, "Unbound"),
        }
    }
}

#[cfg(target_os = "linux")]
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
#[cfg(target_os = "linux")]
use i2cdev::core::I2CDevice;

use super::{HardwareInterface, RegisterInterface};
use crate::errors::{SensorError, SensorResult};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// I2C bus error type - platform specific
#[cfg(target_os = "linux")]
pub type I2CError = LinuxI2CError;

#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
pub struct I2CError(String);

#[cfg(not(target_os = "linux"))]
impl std::fmt::Display for I2CError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "I2C not supported on this platform: {}", self.0)
    }
}

#[cfg(not(target_os = "linux"))]
impl std::error::Error for I2CError {}

/// I2C bus implementation
#[cfg(target_os = "linux")]
pub struct I2CBus {
    device: LinuxI2CDevice,
}

#[cfg(not(target_os = "linux"))]
pub struct I2CBus {
    _phantom: std::marker::PhantomData<()>,
}

#[cfg(target_os = "linux")]
impl I2CBus {
    pub fn new(path: &str) -> Result<Self, I2CError> {
        let device = LinuxI2CDevice::new(path, 0)?;
        Ok(Self { device })
    }

    pub fn read_bytes(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> Result<(), I2CError> {
        self.device.set_slave_address(address as u16)?;

        if buf.len() == 1 {
            // SMBus read byte data for single byte reads
            buf[0] = self.device.smbus_read_byte_data(reg)?;
        } else {
            let temp_buf = self.device.smbus_read_i2c_block_data(reg, buf.len() as u8)?;
            buf.copy_from_slice(&temp_buf);
        }

        Ok(())
    }

    pub fn write_byte(&mut self, address: u8, reg: u8, byte: u8) -> Result<(), I2CError> {
        self.device.set_slave_address(address as u16)?;
        self.device.smbus_write_byte_data(reg, byte)
    }
}

#[cfg(not(target_os = "linux"))]
impl I2CBus {
    pub fn new(_path: &str) -> Result<Self, I2CError> {
        Err(I2CError("I2C is only supported on Linux".to_string()))
    }

    pub fn read_bytes(&mut self, _address: u8, _reg: u8, _buf: &mut [u8]) -> Result<(), I2CError> {
        Err(I2CError("I2C is only supported on Linux".to_string()))
    }

    pub fn write_byte(&mut self, _address: u8, _reg: u8, _byte: u8) -> Result<(), I2CError> {
        Err(I2CError("I2C is only supported on Linux".to_string()))
    }
}

/// One device address on a shared I2C bus
pub struct I2cRegisterInterface {
    bus: Arc<Mutex<I2CBus>>,
    address: u8,
}

impl I2cRegisterInterface {
    pub fn new(bus: Arc<Mutex<I2CBus>>, address: u8) -> Self {
        Self { bus, address }
    }

    fn poisoned(&self) -> SensorError {
        SensorError::BusError {
            address: self.address,
            reason: "bus lock poisoned".to_string(),
        }
    }
}

impl RegisterInterface for I2cRegisterInterface {
    fn address(&self) -> u8 {
        self.address
    }

    fn read_regs(&self, reg: u8, buf: &mut [u8]) -> SensorResult<()> {
        let mut bus = self.bus.lock().map_err(|_| self.poisoned())?;
        bus.read_bytes(self.address, reg, buf)?;
        Ok(())
    }

    fn write_reg(&self, reg: u8, value: u8) -> SensorResult<()> {
        let mut bus = self.bus.lock().map_err(|_| self.poisoned())?;
        bus.write_byte(self.address, reg, value)?;
        Ok(())
    }
}

/// Hardware attachment for a sensor wired straight to an I2C bus
pub struct I2cBusInterface {
    bus_id: String,
    path: String,
}

impl I2cBusInterface {
    pub fn new(bus_id: String, path: String) -> Self {
        Self { bus_id, path }
    }
}

impl HardwareInterface for I2cBusInterface {
    fn init(&self) -> bool {
        let present = Path::new(&self.path).exists();
        debug!("[{}] bus device {} present: {}", self.bus_id, self.path, present);
        present
    }

    // Direct wiring, nothing to route.
    fn swap_in(&self) {}

    fn describe(&self) -> String {
        format!("i2c:{}@{}", self.bus_id, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_interface_missing_device() {
        let hw = I2cBusInterface::new("i2c9".to_string(), "/nonexistent/i2c-9".to_string());
        assert!(!hw.init());
        assert_eq!(hw.describe(), "i2c:i2c9@/nonexistent/i2c-9");
    }
}

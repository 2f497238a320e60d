use nalgebra::Vector3;
use std::sync::Arc;

use crate::bus::RegisterInterface;
use crate::errors::{SensorError, SensorResult};

// Register addresses for the LIS3MDL
const WHO_AM_I: u8 = 0x0F;
const CTRL_REG1: u8 = 0x20;
const CTRL_REG2: u8 = 0x21;
const CTRL_REG3: u8 = 0x22;
const CTRL_REG4: u8 = 0x23;
const OUT_X_L: u8 = 0x28;

pub const WHOAMI_LIS3MDL: u8 = 0x3D;

// Sensitivity for +/- 4 gauss full scale
const SENSITIVITY_4GAUSS: f32 = 0.00014; // Tesla per LSB

/// Auxiliary magnetometer attached next to an IMU
pub struct Lis3mdl {
    registers: Arc<dyn RegisterInterface>,
}

impl Lis3mdl {
    pub const NAME: &'static str = "LIS3MDL";

    pub fn new(registers: Arc<dyn RegisterInterface>) -> Self {
        Self { registers }
    }

    pub fn init(&self, owner: &str) -> SensorResult<()> {
        let who_am_i = self.registers.read_reg(WHO_AM_I)?;
        if who_am_i != WHOAMI_LIS3MDL {
            return Err(SensorError::WrongChipId {
                sensor: format!("{}/{}", owner, Self::NAME),
                expected: WHOAMI_LIS3MDL,
                actual: who_am_i,
            });
        }

        // Temp sensor disabled, medium-performance mode, 80 Hz ODR
        self.configure(owner, CTRL_REG1, 0b0101_1100)?;
        // +/- 4 gauss full scale
        self.configure(owner, CTRL_REG2, 0b0000_0000)?;
        // Continuous-conversion mode
        self.configure(owner, CTRL_REG3, 0b0000_0000)?;
        // Z-axis medium-performance mode
        self.configure(owner, CTRL_REG4, 0b0000_0100)?;
        Ok(())
    }

    /// Power down: single-conversion idle
    pub fn sleep(&self) -> SensorResult<()> {
        self.registers.write_reg(CTRL_REG3, 0b0000_0011)
    }

    pub fn wake(&self, owner: &str) -> SensorResult<()> {
        self.configure(owner, CTRL_REG3, 0b0000_0000)
    }

    /// Field in Tesla
    pub fn read(&self, owner: &str) -> SensorResult<Vector3<f32>> {
        let mut buf = [0u8; 6];
        self.registers
            .read_regs(OUT_X_L, &mut buf)
            .map_err(|e| SensorError::ReadError {
                sensor: format!("{}/{}", owner, Self::NAME),
                reason: format!("Failed to read magnetometer data: {}", e),
            })?;

        Ok(Vector3::new(
            i16::from_le_bytes([buf[0], buf[1]]) as f32 * SENSITIVITY_4GAUSS,
            i16::from_le_bytes([buf[2], buf[3]]) as f32 * SENSITIVITY_4GAUSS,
            i16::from_le_bytes([buf[4], buf[5]]) as f32 * SENSITIVITY_4GAUSS,
        ))
    }

    fn configure(&self, owner: &str, reg: u8, value: u8) -> SensorResult<()> {
        self.registers
            .write_reg(reg, value)
            .map_err(|e| SensorError::InitError {
                sensor: format!("{}/{}", owner, Self::NAME),
                reason: format!("Failed to configure {:#04x}: {}", reg, e),
            })
    }
}

//! In-memory bus doubles for tests and host-side simulation

use super::{HardwareInterface, RegisterInterface};
use crate::errors::{SensorError, SensorResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Register map backed by a `HashMap`, with a switch to simulate bus faults.
///
/// Unset registers read as zero. Writes are recorded and also stored, so a
/// write followed by a read returns the written value.
#[derive(Debug, Default)]
pub struct MockRegisters {
    address: u8,
    registers: Mutex<HashMap<u8, u8>>,
    writes: Mutex<Vec<(u8, u8)>>,
    failing: AtomicBool,
    reads: AtomicUsize,
}

impl MockRegisters {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }

    pub fn set(&self, reg: u8, value: u8) {
        self.registers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(reg, value);
    }

    pub fn set_block(&self, reg: u8, values: &[u8]) {
        let mut registers = self.registers.lock().unwrap_or_else(|e| e.into_inner());
        for (offset, value) in values.iter().enumerate() {
            registers.insert(reg.wrapping_add(offset as u8), *value);
        }
    }

    /// Make every subsequent access fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check(&self) -> SensorResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SensorError::BusError {
                address: self.address,
                reason: "simulated bus fault".to_string(),
            });
        }
        Ok(())
    }
}

impl RegisterInterface for MockRegisters {
    fn address(&self) -> u8 {
        self.address
    }

    fn read_regs(&self, reg: u8, buf: &mut [u8]) -> SensorResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let registers = self.registers.lock().unwrap_or_else(|e| e.into_inner());
        for (offset, byte) in buf.iter_mut().enumerate() {
            *byte = registers
                .get(&reg.wrapping_add(offset as u8))
                .copied()
                .unwrap_or(0);
        }
        Ok(())
    }

    fn write_reg(&self, reg: u8, value: u8) -> SensorResult<()> {
        self.check()?;
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((reg, value));
        self.set(reg, value);
        Ok(())
    }
}

/// Hardware attachment that is always present and counts bus swaps
#[derive(Debug, Default)]
pub struct MockHardware {
    name: String,
    swaps: AtomicUsize,
}

impl MockHardware {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            swaps: AtomicUsize::new(0),
        }
    }

    pub fn swap_count(&self) -> usize {
        self.swaps.load(Ordering::SeqCst)
    }
}

impl HardwareInterface for MockHardware {
    fn init(&self) -> bool {
        true
    }

    fn swap_in(&self) {
        self.swaps.fetch_add(1, Ordering::SeqCst);
    }

    fn describe(&self) -> String {
        format!("mock:{}", self.name)
    }
}

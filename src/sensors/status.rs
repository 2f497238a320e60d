use serde::Serialize;
use std::fmt;

/// Health classification reported for every sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SensorStatus {
    /// Unbound, or setup has not completed
    Offline = 0,
    /// Hardware responded and is being polled
    Ok = 1,
    /// Was working, then reads failed or the device reported a fault
    Error = 2,
}

impl SensorStatus {
    /// Classification from the base lifecycle flags
    pub fn derive(valid: bool, working: bool, faulted: bool) -> Self {
        match (valid && working, faulted) {
            (false, _) => SensorStatus::Offline,
            (true, true) => SensorStatus::Error,
            (true, false) => SensorStatus::Ok,
        }
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SensorStatus::Offline => "OFFLINE",
            SensorStatus::Ok => "OK",
            SensorStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

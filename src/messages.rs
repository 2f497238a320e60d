use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Monotonic nanoseconds since the first message of this process
fn monotonic_ns() -> u64 {
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Header metadata common to all emitted messages
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Header {
    pub sensor_id: u8,
    /// Sequence number for message ordering, per transport
    pub seq: u64,
    /// Monotonic timestamp in nanoseconds
    pub t_mono_ns: u64,
}

impl Header {
    pub fn new(sensor_id: u8, seq: u64) -> Self {
        Self {
            sensor_id,
            seq,
            t_mono_ns: monotonic_ns(),
        }
    }
}

/// Rotation payload kind on the wire; only regular updates are emitted
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RotationDataType {
    Normal = 1,
}

/// Fused orientation, sensor offset already applied
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RotationMessage {
    pub h: Header,
    pub data_type: RotationDataType,
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Coarse calibration confidence
    pub accuracy: u8,
}

/// Acceleration (m/s²)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccelerationMessage {
    pub h: Header,
    pub ax: f32,
    pub ay: f32,
    pub az: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum SensorMessage {
    Rotation(RotationMessage),
    Acceleration(AccelerationMessage),
}

impl SensorMessage {
    pub fn header(&self) -> &Header {
        match self {
            SensorMessage::Rotation(msg) => &msg.h,
            SensorMessage::Acceleration(msg) => &msg.h,
        }
    }

    pub fn sensor_id(&self) -> u8 {
        self.header().sensor_id
    }

    /// Serialize to JSON for debugging
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

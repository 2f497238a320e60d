use nalgebra::{UnitQuaternion, Vector3};
use tokio::sync::broadcast;
use tracing::trace;

use crate::messages::{
    AccelerationMessage, Header, RotationDataType, RotationMessage, SensorMessage,
};

/// Consumer of emitted sensor data.
///
/// Implementations must not block: a full or absent consumer drops data.
pub trait DataTransport {
    fn send_rotation(&mut self, sensor_id: u8, rotation: &UnitQuaternion<f32>, accuracy: u8);

    fn send_acceleration(&mut self, sensor_id: u8, acceleration: &Vector3<f32>);
}

/// In-process fan-out over a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: broadcast::Sender<SensorMessage>,
    seq: u64,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, seq: 0 }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SensorMessage> {
        self.tx.subscribe()
    }

    fn publish(&mut self, message: SensorMessage) {
        // Err only means nobody is listening right now.
        if self.tx.send(message).is_err() {
            trace!("no subscribers, message dropped");
        }
    }

    fn next_header(&mut self, sensor_id: u8) -> Header {
        self.seq += 1;
        Header::new(sensor_id, self.seq)
    }
}

impl DataTransport for ChannelTransport {
    fn send_rotation(&mut self, sensor_id: u8, rotation: &UnitQuaternion<f32>, accuracy: u8) {
        let q = rotation.quaternion();
        let message = SensorMessage::Rotation(RotationMessage {
            h: self.next_header(sensor_id),
            data_type: RotationDataType::Normal,
            w: q.w,
            x: q.i,
            y: q.j,
            z: q.k,
            accuracy,
        });
        self.publish(message);
    }

    fn send_acceleration(&mut self, sensor_id: u8, acceleration: &Vector3<f32>) {
        let message = SensorMessage::Acceleration(AccelerationMessage {
            h: self.next_header(sensor_id),
            ax: acceleration.x,
            ay: acceleration.y,
            az: acceleration.z,
        });
        self.publish(message);
    }
}

/// Collects everything handed to it
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    pub rotations: Vec<(u8, UnitQuaternion<f32>, u8)>,
    pub accelerations: Vec<(u8, Vector3<f32>)>,
}

#[cfg(test)]
impl DataTransport for RecordingTransport {
    fn send_rotation(&mut self, sensor_id: u8, rotation: &UnitQuaternion<f32>, accuracy: u8) {
        self.rotations.push((sensor_id, *rotation, accuracy));
    }

    fn send_acceleration(&mut self, sensor_id: u8, acceleration: &Vector3<f32>) {
        self.accelerations.push((sensor_id, *acceleration));
    }
}

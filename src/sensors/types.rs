use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware family of a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SensorTypeId {
    Unknown = 0,
    Mpu9250 = 1,
    Mpu6500 = 2,
    Bno080 = 3,
    Bno085 = 4,
    Bno055 = 5,
    Mpu6050 = 6,
    Bno086 = 7,
    Bmi160 = 8,
    Icm20948 = 9,
    Icm42688 = 10,
    Bmi270 = 11,
    Lsm6ds3trc = 12,
    Lsm6dsv = 13,
    Lsm6dso = 14,
    Lsm6dsr = 15,
    Icm45686 = 16,
    Icm45605 = 17,
    AdcResistance = 18,
    Lsm6dsl = 19,
    Empty = 255,
}

impl SensorTypeId {
    /// Display name of the chip family
    pub fn name(&self) -> &'static str {
        match self {
            SensorTypeId::Unknown => "Unknown",
            SensorTypeId::Mpu9250 => "MPU9250",
            SensorTypeId::Mpu6500 => "MPU6500",
            SensorTypeId::Bno080 => "BNO080",
            SensorTypeId::Bno085 => "BNO085",
            SensorTypeId::Bno055 => "BNO055",
            SensorTypeId::Mpu6050 => "MPU6050",
            SensorTypeId::Bno086 => "BNO086",
            SensorTypeId::Bmi160 => "BMI160",
            SensorTypeId::Icm20948 => "ICM20948",
            SensorTypeId::Icm42688 => "ICM42688",
            SensorTypeId::Bmi270 => "BMI270",
            SensorTypeId::Lsm6ds3trc => "LSM6DS3TR-C",
            SensorTypeId::Lsm6dsv => "LSM6DSV",
            SensorTypeId::Lsm6dso => "LSM6DSO",
            SensorTypeId::Lsm6dsr => "LSM6DSR",
            SensorTypeId::Icm45686 => "ICM45686",
            SensorTypeId::Icm45605 => "ICM45605",
            SensorTypeId::AdcResistance => "ADC Resistance",
            SensorTypeId::Lsm6dsl => "LSM6DSL",
            SensorTypeId::Empty => "None",
        }
    }
}

impl fmt::Display for SensorTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where on the body a tracker is worn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SensorPosition {
    #[default]
    None = 0,
    Head = 1,
    Neck = 2,
    UpperChest = 3,
    Chest = 4,
    Waist = 5,
    Hip = 6,
    LeftUpperLeg = 7,
    RightUpperLeg = 8,
    LeftLowerLeg = 9,
    RightLowerLeg = 10,
    LeftFoot = 11,
    RightFoot = 12,
    LeftLowerArm = 13,
    RightLowerArm = 14,
    LeftUpperArm = 15,
    RightUpperArm = 16,
    LeftHand = 17,
    RightHand = 18,
    LeftShoulder = 19,
    RightShoulder = 20,
}

/// Kind of payload a sensor emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorDataType {
    #[default]
    Rotation,
    FlexResistance,
    FlexAngle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(SensorTypeId::Icm42688.name(), "ICM42688");
        assert_eq!(SensorTypeId::Empty.to_string(), "None");
        assert_eq!(SensorTypeId::Empty as u8, 255);
    }

    #[test]
    fn test_position_from_config() {
        #[derive(Deserialize)]
        struct Entry {
            position: SensorPosition,
        }
        let entry: Entry = toml::from_str("position = \"left_upper_leg\"").unwrap();
        assert_eq!(entry.position, SensorPosition::LeftUpperLeg);
        assert_eq!(SensorPosition::default(), SensorPosition::None);
    }
}

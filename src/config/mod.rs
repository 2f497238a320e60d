pub mod bus_config;
pub mod calibration_store;
pub mod sensor_config;

pub use bus_config::{load_bus_config, BusConfig, BusEntry};
pub use calibration_store::{CalibrationStore, FileCalibrationStore, MemoryCalibrationStore};
pub use sensor_config::{load_sensor_config, RuntimeConfig, SensorConfig, SensorEntry};

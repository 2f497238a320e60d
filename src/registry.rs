use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::bus::i2c::{I2CBus, I2cBusInterface, I2cRegisterInterface};
use crate::bus::{BusType, EmptyRegisterInterface, HardwareBinding, HardwareInterface, RegisterInterface};
use crate::config::{BusConfig, BusEntry, CalibrationStore, SensorConfig, SensorEntry};
use crate::errors::{RegistryError, RegistryResult, SensorError};
use crate::sensors::empty::ErroneousSensor;
use crate::sensors::{find_factory, DriverContext, Sensor, SensorCore, SensorToggle};

/// Register access and hardware binding handed to one configured sensor
pub struct Attachment {
    pub registers: Arc<dyn RegisterInterface>,
    pub magnetometer: Option<Arc<dyn RegisterInterface>>,
    pub hardware: HardwareBinding,
}

impl Attachment {
    /// Nothing reachable: reads fail and the sensor stays unbound
    pub fn detached() -> Self {
        Self {
            registers: Arc::new(EmptyRegisterInterface),
            magnetometer: None,
            hardware: HardwareBinding::Unbound,
        }
    }
}

struct OpenBus {
    entry: BusEntry,
    bus: Arc<Mutex<I2CBus>>,
}

/// Build one sensor from its config entry.
///
/// An unbound attachment gets a placeholder instead of the configured driver;
/// the sensor stays OFFLINE and never touches I/O.
pub fn build_sensor(
    entry: &SensorEntry,
    attachment: Attachment,
    store: Arc<dyn CalibrationStore>,
) -> RegistryResult<Sensor> {
    let factory = find_factory(&entry.driver).map_err(RegistryError::DriverCreationError)?;

    let driver = if attachment.hardware.is_bound() {
        factory.create(&DriverContext {
            magnetometer: attachment.magnetometer,
            calibration_store: store,
        })
    } else {
        warn!(
            "[registry] sensor {} ({}) has no usable hardware",
            entry.id, entry.driver
        );
        Box::new(ErroneousSensor::new(factory.sensor_type()))
    };

    let sensor_type = factory.sensor_type();
    let core = SensorCore::new(
        sensor_type.name(),
        sensor_type,
        entry.id,
        attachment.registers,
        entry.rotation_deg.to_radians(),
        attachment.hardware,
    );
    let mut sensor = Sensor::new(core, driver);
    sensor.set_sensor_info(entry.position);
    for toggle in SensorToggle::ALL {
        sensor.set_flag(toggle, entry.toggles.get(toggle));
    }
    Ok(sensor)
}

fn open_buses(bus_config: &BusConfig) -> HashMap<String, Option<OpenBus>> {
    let mut buses = HashMap::new();
    for b in bus_config.buses.iter() {
        let opened = match BusType::from_str(&b.r#type) {
            Some(BusType::I2C) => match I2CBus::new(&b.path) {
                Ok(bus) => {
                    info!("[registry] opened bus {} at {}", b.id, b.path);
                    Some(OpenBus {
                        entry: b.clone(),
                        bus: Arc::new(Mutex::new(bus)),
                    })
                }
                Err(e) => {
                    warn!("[registry] failed to open bus {} at {}: {}", b.id, b.path, e);
                    None
                }
            },
            None => {
                warn!("[registry] bus {} has unsupported type {}", b.id, b.r#type);
                None
            }
        };
        buses.insert(b.id.clone(), opened);
    }
    buses
}

fn attach(entry: &SensorEntry, bus: Option<&OpenBus>) -> Attachment {
    let Some(open) = bus else {
        return Attachment::detached();
    };

    let hw = I2cBusInterface::new(open.entry.id.clone(), open.entry.path.clone());
    let hardware = if hw.init() {
        let hw: Arc<dyn HardwareInterface> = Arc::new(hw);
        HardwareBinding::Bound(hw)
    } else {
        HardwareBinding::Unbound
    };

    let registers: Arc<dyn RegisterInterface> =
        Arc::new(I2cRegisterInterface::new(open.bus.clone(), entry.address));
    let magnetometer = entry.magnetometer_address.map(|address| {
        let mag: Arc<dyn RegisterInterface> =
            Arc::new(I2cRegisterInterface::new(open.bus.clone(), address));
        mag
    });

    Attachment {
        registers,
        magnetometer,
        hardware,
    }
}

/// Open every configured bus and build every configured sensor.
///
/// Sensors are returned OFFLINE; the caller runs setup.
pub fn init_all(
    sensor_config: &SensorConfig,
    bus_config: &BusConfig,
    store: Arc<dyn CalibrationStore>,
) -> RegistryResult<Vec<Sensor>> {
    let buses = open_buses(bus_config);

    let mut seen = HashSet::new();
    let mut sensors = Vec::with_capacity(sensor_config.sensors.len());
    info!("[registry] initializing {} sensors...", sensor_config.sensors.len());
    for s in sensor_config.sensors.iter() {
        if !seen.insert(s.id) {
            return Err(RegistryError::DuplicateSensor { id: s.id });
        }
        let bus = buses.get(&s.bus).ok_or_else(|| {
            RegistryError::DriverCreationError(SensorError::BusNotFound { bus: s.bus.clone() })
        })?;

        let sensor = build_sensor(s, attach(s, bus.as_ref()), store.clone())?;
        info!(
            "[registry] registering sensor: id={} driver={} bus={} address={:#04x}",
            s.id, s.driver, s.bus, s.address
        );
        sensors.push(sensor);
    }

    Ok(sensors)
}

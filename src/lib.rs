pub mod bus;
pub mod config;
pub mod errors;
pub mod logging;
pub mod messages;
pub mod registry;
pub mod scheduler;
pub mod sensors;
pub mod transport;

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, trace, warn};

use crate::config::{load_bus_config, load_sensor_config, CalibrationStore, FileCalibrationStore};
use crate::errors::RegistryResult;
use crate::registry::init_all;
use crate::transport::ChannelTransport;

pub use crate::errors::{ConfigError, RegistryError, SensorError};
pub use crate::logging::init_tracing;
pub use crate::sensors::{Sensor, SensorCore, SensorDriver, SensorStatus};

const CHANNEL_CAPACITY: usize = 256;

/// Load config from `config_path`, bring every sensor up and run the control
/// loop until Ctrl-C.
pub async fn run_sensor_hub(config_path: &str) -> RegistryResult<()> {
    let sensor_config = load_sensor_config(&format!("{}/sensors.toml", config_path))?;
    let bus_config = load_bus_config(&format!("{}/buses.toml", config_path))?;
    info!("[config] loaded {} sensor(s), {} bus(es)", sensor_config.sensors.len(), bus_config.buses.len());

    let store: Arc<dyn CalibrationStore> =
        Arc::new(FileCalibrationStore::new(&sensor_config.runtime.calibration_dir));
    let mut sensors = init_all(&sensor_config, &bus_config, store)?;
    for sensor in sensors.iter_mut() {
        sensor.motion_setup();
        sensor.post_setup();
    }

    let mut transport = ChannelTransport::new(CHANNEL_CAPACITY);
    let mut rx = transport.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(message) => match message.to_json() {
                    Ok(json) => trace!("[transport] {}", json),
                    Err(e) => warn!("[transport] unserializable message: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => warn!("[transport] subscriber lagged, {} messages skipped", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        _ = scheduler::run(&mut sensors, &mut transport, &sensor_config.runtime) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("[main] failed to listen for Ctrl-C: {}", e);
            }
            info!("[main] shutting down");
        }
    }

    Ok(())
}

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::RuntimeConfig;
use crate::sensors::{Sensor, SensorStatus};
use crate::transport::DataTransport;

/// One control-loop pass: drive every sensor, then flush what changed.
pub fn run_tick(sensors: &mut [Sensor], transport: &mut dyn DataTransport) {
    for sensor in sensors.iter_mut() {
        sensor.motion_loop();
        sensor.send_data(transport);
    }
}

/// Log a report per sensor and optionally re-run setup on errored ones
pub fn report_and_recover(sensors: &mut [Sensor], retry_errored: bool) {
    for sensor in sensors.iter_mut() {
        let report = sensor.report();
        match serde_json::to_string(&report) {
            Ok(json) => info!("[report] {}", json),
            Err(e) => warn!("[report] sensor {} not serializable: {}", report.id, e),
        }

        if retry_errored && sensor.is_valid() && report.status == SensorStatus::Error {
            info!("[scheduler] retrying setup of sensor {}", report.id);
            sensor.reset();
            sensor.motion_setup();
            sensor.post_setup();
        }
    }
}

/// Run the control loop forever at `tick_hz`
pub async fn run(sensors: &mut [Sensor], transport: &mut dyn DataTransport, runtime: &RuntimeConfig) {
    let period = Duration::from_secs_f64(1.0 / runtime.tick_hz.max(1) as f64);
    let ticks_per_report = (runtime.report_interval_secs.max(1) * runtime.tick_hz.max(1) as u64).max(1);

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(
        "[scheduler] driving {} sensors at {}Hz",
        sensors.len(),
        runtime.tick_hz
    );

    let mut tick: u64 = 0;
    loop {
        ticker.tick().await;
        run_tick(sensors, transport);

        tick += 1;
        if tick % ticks_per_report == 0 {
            report_and_recover(sensors, runtime.retry_errored);
        }
    }
}

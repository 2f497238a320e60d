use std::process::ExitCode;
use tracing::{error, info};
use tracker_sensors::{init_tracing, run_sensor_hub};

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG=debug for verbose, RUST_LOG=trace to see every emitted message
    init_tracing();

    info!("[tracker-sensors] starting up...");

    // Load configuration from CONFIG_PATH or default
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
    match run_sensor_hub(&config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[error] {}", e);
            ExitCode::FAILURE
        }
    }
}

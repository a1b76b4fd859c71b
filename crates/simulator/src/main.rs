//! `farmlink-simulator` -- standalone simulated farm device.
//!
//! Runs the simulation engine and connects to the relay hub over WebSocket
//! as if it were a physical controller: telemetry goes up as
//! `telemetry_update`, operator commands come back as `sim_*` events.
//!
//! # Environment variables
//!
//! | Variable            | Required | Default | Description                               |
//! |---------------------|----------|---------|-------------------------------------------|
//! | `HUB_WS_URL`        | yes      | --      | Relay endpoint, e.g. `ws://host:8080/ws`  |
//! | `SIM_TICK_SECS`     | no       | `5`     | Seconds between simulation ticks          |
//! | `SIM_WATERING_SECS` | no       | `3`     | Seconds the pump runs when auto watering  |

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use farmlink_simulator::{sender, EngineConfig, SimulationEngine};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farmlink_simulator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ws_url = std::env::var("HUB_WS_URL").unwrap_or_else(|_| {
        tracing::error!("HUB_WS_URL environment variable is required");
        std::process::exit(1);
    });

    let config = EngineConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid simulator configuration");
        std::process::exit(1);
    });

    tracing::info!(
        ws_url = %ws_url,
        tick_secs = config.tick_interval.as_secs(),
        watering_secs = config.watering_duration.as_secs(),
        "Starting farmlink-simulator",
    );

    let cancel = CancellationToken::new();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (telemetry_tx, telemetry_rx) = mpsc::unbounded_channel();

    let engine = SimulationEngine::new(config);
    let engine_handle = tokio::spawn(engine.run(command_rx, telemetry_tx, cancel.clone()));

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down");
        }
        shutdown.cancel();
    });

    sender::run(&ws_url, telemetry_rx, command_tx, cancel.clone()).await;

    cancel.cancel();
    let _ = engine_handle.await;
    tracing::info!("Simulator stopped");
}

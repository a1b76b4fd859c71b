use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use farmlink_api::config::ServerConfig;
use farmlink_api::relay::RelayHub;
use farmlink_api::router::build_app_router;
use farmlink_api::state::AppState;
use farmlink_api::{mqtt, simulation, ws};
use farmlink_core::protocol::CommandTable;
use farmlink_events::{AlertNotifier, EventBus};
use farmlink_simulator::SimulationEngine;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "farmlink_api=debug,farmlink_events=info,farmlink_simulator=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid server configuration");
        std::process::exit(1);
    });
    tracing::info!(
        host = %config.host,
        port = %config.port,
        alert_field = %config.thresholds.field,
        critical_threshold = config.thresholds.critical_threshold,
        recovery_threshold = config.thresholds.recovery_threshold(),
        simulator = config.simulator.is_some(),
        mqtt = config.mqtt.is_some(),
        "Loaded server configuration"
    );

    let cancel = CancellationToken::new();

    // --- Event bus + notifier ---
    let event_bus = Arc::new(EventBus::default());
    let notifier = AlertNotifier::new(config.push.clone()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build push client");
        std::process::exit(1);
    });
    let notifier_handle = tokio::spawn(notifier.run(event_bus.subscribe(), cancel.clone()));
    tracing::info!(endpoint = %config.push.endpoint, "Alert notifier started");

    // --- Relay hub ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let hub = Arc::new(RelayHub::new(
        Arc::clone(&ws_manager),
        CommandTable::default(),
        config.thresholds,
        Arc::clone(&event_bus),
    ));

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), cancel.clone());

    // --- In-process simulator ---
    let simulator_handle = config.simulator.map(|engine_config| {
        tracing::info!("Starting in-process simulator");
        tokio::spawn(simulation::run(
            Arc::clone(&hub),
            SimulationEngine::new(engine_config),
            cancel.clone(),
        ))
    });

    // --- MQTT ingestion ---
    let mqtt_handle = config.mqtt.clone().map(|mqtt_config| {
        tokio::spawn(mqtt::run(Arc::clone(&hub), mqtt_config, cancel.clone()))
    });

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        hub: Arc::clone(&hub),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let ip = config.host.parse().unwrap_or_else(|e| {
        tracing::error!(host = %config.host, error = %e, "Invalid HOST address");
        std::process::exit(1);
    });
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap_or_else(|e| {
        tracing::error!(%addr, error = %e, "Failed to bind to address");
        std::process::exit(1);
    });

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    if let Some(handle) = simulator_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Simulator stopped");
    }
    if let Some(handle) = mqtt_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    let _ = tokio::time::timeout(Duration::from_secs(5), notifier_handle).await;
    tracing::info!("Alert notifier stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    let _ = heartbeat_handle.await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

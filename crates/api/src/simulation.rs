//! In-process simulator peer.
//!
//! When `SIMULATOR_ENABLED` is set the hub hosts the simulation engine
//! itself. The engine is registered as an ordinary peer named
//! [`SIMULATOR_PEER_ID`]: its telemetry enters the hub exactly like a
//! device's would, and translated `sim_*` commands reach it through its own
//! peer queue.

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use farmlink_core::protocol::Frame;
use farmlink_simulator::SimulationEngine;

use crate::relay::RelayHub;

/// Peer id the in-process simulator registers under.
pub const SIMULATOR_PEER_ID: &str = "simulator";

/// Run `engine` as a hub peer until `cancel` fires or the engine stops.
pub async fn run(hub: Arc<RelayHub>, engine: SimulationEngine, cancel: CancellationToken) {
    let mut inbound = hub.connect(SIMULATOR_PEER_ID).await;

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (telemetry_tx, mut telemetry_rx) = mpsc::unbounded_channel();
    let engine_handle = tokio::spawn(engine.run(command_rx, telemetry_tx, cancel.clone()));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = telemetry_rx.recv() => {
                let Some(frame) = frame else {
                    tracing::info!("Simulation engine stopped");
                    break;
                };
                hub.on_event(SIMULATOR_PEER_ID, &frame.event, frame.data).await;
            }
            msg = inbound.recv() => {
                match msg {
                    Some(Message::Text(text)) => match Frame::decode(text.as_str()) {
                        Ok(frame) => {
                            if command_tx.send(frame).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "Simulator peer got undecodable frame");
                        }
                    },
                    Some(Message::Close(_)) | None => break,
                    Some(_) => {}
                }
            }
        }
    }

    drop(command_tx);
    hub.disconnect(SIMULATOR_PEER_ID).await;
    let _ = engine_handle.await;
}

//! End-to-end tests over real WebSocket connections and the in-process
//! simulator peer.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use farmlink_api::relay::RelayHub;
use farmlink_api::simulation;
use farmlink_core::protocol::Frame;
use farmlink_simulator::{EngineConfig, SimulationEngine};

type Client = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const WAIT: Duration = Duration::from_secs(5);

async fn spawn_server() -> (String, Arc<RelayHub>) {
    let (app, hub) = common::build_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("ws://{addr}/ws"), hub)
}

async fn wait_for_peers(hub: &RelayHub, count: usize) {
    tokio::time::timeout(WAIT, async {
        while hub.peers().connection_count().await != count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("peers should register");
}

/// Read frames until one with `event` arrives.
async fn next_event(client: &mut Client, event: &str) -> Frame {
    tokio::time::timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => {
                    let frame = Frame::decode(&text).expect("relayed frame decodes");
                    if frame.event == event {
                        return frame;
                    }
                }
                Some(Ok(_)) => {}
                other => panic!("connection ended early: {other:?}"),
            }
        }
    })
    .await
    .expect("frame should arrive")
}

// ---------------------------------------------------------------------------
// Test: telemetry and commands cross real sockets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn frames_relay_between_websocket_peers() {
    let (url, hub) = spawn_server().await;

    let (mut device, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    let (mut browser, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    wait_for_peers(&hub, 2).await;

    let telemetry = Frame::new("telemetry_update", json!({ "soil": 48 }));
    device.send(Message::Text(telemetry.encode())).await.unwrap();
    let frame = next_event(&mut browser, "telemetry_update").await;
    assert_eq!(frame.data, json!({ "soil": 48 }));

    let command = Frame::new("command_water", json!({ "plant": "olive" }));
    browser.send(Message::Text(command.encode())).await.unwrap();
    let frame = next_event(&mut device, "sim_water_plant").await;
    assert_eq!(frame.data, json!({ "plant": "olive" }));

    drop(browser);
    wait_for_peers(&hub, 1).await;
}

// ---------------------------------------------------------------------------
// Test: the in-process simulator answers translated commands
// ---------------------------------------------------------------------------

#[tokio::test]
async fn in_process_simulator_applies_force_start() {
    let (url, hub) = spawn_server().await;
    let cancel = CancellationToken::new();

    let engine = SimulationEngine::new(EngineConfig {
        tick_interval: Duration::from_secs(3600),
        watering_duration: Duration::from_secs(3),
    });
    let sim = tokio::spawn(simulation::run(Arc::clone(&hub), engine, cancel.clone()));

    let (mut browser, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
    wait_for_peers(&hub, 2).await;

    let command = Frame::bare("command_force_start");
    browser.send(Message::Text(command.encode())).await.unwrap();

    let frame = tokio::time::timeout(WAIT, async {
        loop {
            let frame = next_event(&mut browser, "telemetry_update").await;
            if frame.data["pump"]["state"] == "ON" {
                return frame;
            }
        }
    })
    .await
    .expect("simulator should report the pump on");
    assert_eq!(frame.data["pump"]["manual_override"], true);

    cancel.cancel();
    sim.await.unwrap();
    assert_eq!(hub.peers().connection_count().await, 1, "simulator peer deregistered");
}

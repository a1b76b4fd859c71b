//! MQTT telemetry ingestion.
//!
//! Field devices usually publish their readings to a broker topic rather
//! than speaking the hub's WebSocket framing. When `MQTT_BROKER` is set the
//! hub subscribes to `MQTT_TOPIC` and feeds every JSON message into the
//! relay as a `telemetry_update` from the [`MQTT_PEER_ID`] source. That
//! source is never a registered peer, so every connected peer receives it.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use farmlink_core::event_names::EVENT_TELEMETRY_UPDATE;

use crate::relay::{RelayHub, RelayOutcome};

/// Source id used for telemetry that arrived over MQTT.
pub const MQTT_PEER_ID: &str = "mqtt";

pub const DEFAULT_MQTT_PORT: u16 = 1883;

pub const DEFAULT_MQTT_TOPIC: &str = "farmlink/telemetry";

const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Pause before polling again after a broker error (the event loop
/// reconnects on the next poll).
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Request queue between the client handle and its event loop.
const CLIENT_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
}

/// Decode one broker message and relay it as telemetry.
///
/// Payloads that are not JSON are logged and dropped.
pub async fn ingest(hub: &RelayHub, topic: &str, payload: &[u8]) -> RelayOutcome {
    match serde_json::from_slice::<Value>(payload) {
        Ok(data) => {
            tracing::debug!(topic, bytes = payload.len(), "MQTT telemetry received");
            hub.on_event(MQTT_PEER_ID, EVENT_TELEMETRY_UPDATE, data).await
        }
        Err(e) => {
            tracing::warn!(topic, error = %e, "Dropping non-JSON MQTT message");
            RelayOutcome::Ignored
        }
    }
}

/// Subscribe to the configured topic and ingest until `cancel` fires.
///
/// The subscription is renewed on every broker `ConnAck`, so it survives
/// reconnects.
pub async fn run(hub: Arc<RelayHub>, config: MqttConfig, cancel: CancellationToken) {
    let mut options = MqttOptions::new(config.client_id.as_str(), config.host.as_str(), config.port);
    options.set_keep_alive(KEEP_ALIVE);

    let (client, mut eventloop) = AsyncClient::new(options, CLIENT_CAPACITY);
    tracing::info!(
        broker = %config.host,
        port = config.port,
        topic = %config.topic,
        "Connecting to MQTT broker"
    );

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!(topic = %config.topic, "Connected to MQTT broker, subscribing");
                if let Err(e) = client.try_subscribe(config.topic.as_str(), QoS::AtMostOnce) {
                    tracing::error!(error = %e, "Failed to queue MQTT subscription");
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                ingest(&hub, &publish.topic, &publish.payload).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "MQTT connection error, retrying");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
        }
    }

    let _ = client.try_disconnect();
    tracing::info!("MQTT ingestion stopped");
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use serde_json::Value;
use tokio::sync::mpsc;

use farmlink_core::alert::AlertAction;
use farmlink_core::alerting::thresholds::ThresholdConfig;
use farmlink_core::protocol::{route, CommandTable, Frame, Route};
use farmlink_events::{AlertEvent, EventBus};

use crate::ws::WsManager;

/// What the hub did with one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Rebroadcast as `event` to `recipients` peers.
    Forwarded { event: String, recipients: usize },
    /// Lifecycle event, logged only.
    Logged,
    /// Unrecognised or undecodable, dropped.
    Ignored,
}

/// Central relay between connected peers.
///
/// Owns the peer registry, the command translation table and the single
/// "alert active" flag. Alert transitions are published on the
/// [`EventBus`]; delivery happens elsewhere.
pub struct RelayHub {
    peers: Arc<WsManager>,
    commands: CommandTable,
    thresholds: ThresholdConfig,
    alert_active: AtomicBool,
    event_bus: Arc<EventBus>,
}

impl RelayHub {
    pub fn new(
        peers: Arc<WsManager>,
        commands: CommandTable,
        thresholds: ThresholdConfig,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            peers,
            commands,
            thresholds,
            alert_active: AtomicBool::new(false),
            event_bus,
        }
    }

    pub fn peers(&self) -> &Arc<WsManager> {
        &self.peers
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn alert_active(&self) -> bool {
        self.alert_active.load(Ordering::SeqCst)
    }

    /// Register a peer and return its outbound queue.
    pub async fn connect(&self, peer_id: &str) -> mpsc::Receiver<Message> {
        let rx = self.peers.add(peer_id.to_string()).await;
        tracing::info!(peer_id, "Peer connected");
        rx
    }

    pub async fn disconnect(&self, peer_id: &str) {
        if let Some(conn) = self.peers.remove(peer_id).await {
            let connected_secs = (chrono::Utc::now() - conn.connected_at).num_seconds();
            tracing::info!(peer_id, connected_secs, "Peer disconnected");
        }
    }

    /// Decode a text frame from `source` and relay it.
    pub async fn on_text(&self, source: &str, text: &str) -> RelayOutcome {
        match Frame::decode(text) {
            Ok(frame) => self.on_event(source, &frame.event, frame.data).await,
            Err(e) => {
                tracing::debug!(peer_id = source, error = %e, "Dropping undecodable frame");
                RelayOutcome::Ignored
            }
        }
    }

    /// Handle one named event from `source`.
    pub async fn on_event(&self, source: &str, event: &str, payload: Value) -> RelayOutcome {
        match route(event, &self.commands) {
            Route::Telemetry => {
                self.evaluate(source, &payload);
                self.forward(source, Frame::new(event, payload)).await
            }
            Route::Command { device_event } => {
                tracing::info!(peer_id = source, command = event, device_event, "Relaying command");
                self.forward(source, Frame::new(device_event, payload)).await
            }
            Route::Lifecycle => {
                tracing::info!(peer_id = source, event, "Lifecycle event");
                RelayOutcome::Logged
            }
            Route::Unknown => {
                tracing::debug!(peer_id = source, event, "Ignoring unrecognised event");
                RelayOutcome::Ignored
            }
        }
    }

    async fn forward(&self, source: &str, frame: Frame) -> RelayOutcome {
        let text = frame.encode();
        let recipients = self
            .peers
            .broadcast_except(source, Message::Text(text.into()))
            .await;
        tracing::debug!(peer_id = source, event = %frame.event, recipients, "Event relayed");
        RelayOutcome::Forwarded {
            event: frame.event,
            recipients,
        }
    }

    /// Run the threshold evaluator against the shared flag.
    ///
    /// The read-decide-write is one `fetch_update`, so concurrent packets
    /// can never both observe `false` and both fire.
    fn evaluate(&self, source: &str, payload: &Value) -> AlertAction {
        let Some(value) = self.thresholds.read(payload) else {
            tracing::debug!(
                peer_id = source,
                field = %self.thresholds.field,
                "Telemetry without a numeric alert field, skipping evaluation"
            );
            return AlertAction::None;
        };

        let mut action = AlertAction::None;
        let _ = self
            .alert_active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |active| {
                let (next, decided) = self.thresholds.evaluate_value(value, active);
                action = decided;
                (next != active).then_some(next)
            });

        match action {
            AlertAction::FireCritical => {
                tracing::warn!(
                    field = %self.thresholds.field,
                    value,
                    threshold = self.thresholds.critical_threshold,
                    "Critical reading, raising alert"
                );
            }
            AlertAction::FireRecovery => {
                tracing::info!(
                    field = %self.thresholds.field,
                    value,
                    threshold = self.thresholds.recovery_threshold(),
                    "Reading recovered, clearing alert"
                );
            }
            AlertAction::None => return action,
        }

        self.event_bus.publish(AlertEvent::new(
            action,
            self.thresholds.field,
            value,
            source,
        ));
        action
    }
}

//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] carries [`AlertEvent`]s from the relay hub to the notifier.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use farmlink_core::alert::{AlertAction, AlertField};

// ---------------------------------------------------------------------------
// AlertEvent
// ---------------------------------------------------------------------------

/// A threshold transition decided by the hub.
#[derive(Debug, Clone, Serialize)]
pub struct AlertEvent {
    pub action: AlertAction,
    /// Telemetry key that was evaluated.
    pub field: AlertField,
    /// The reading that caused the transition.
    pub value: f64,
    /// Peer that sent the telemetry packet.
    pub source_peer: String,
    /// When the transition was decided (UTC).
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(
        action: AlertAction,
        field: AlertField,
        value: f64,
        source_peer: impl Into<String>,
    ) -> Self {
        Self {
            action,
            field,
            value,
            source_peer: source_peer.into(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<AlertEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed events are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Never blocks. With no subscribers the event is dropped.
    pub fn publish(&self, event: AlertEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(AlertEvent::new(
            AlertAction::FireCritical,
            AlertField::Soil,
            21.0,
            "device-1",
        ));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.action, AlertAction::FireCritical);
        assert_eq!(received.field, AlertField::Soil);
        assert_eq!(received.value, 21.0);
        assert_eq!(received.source_peer, "device-1");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(AlertEvent::new(
            AlertAction::FireRecovery,
            AlertField::SoilAvg,
            44.0,
            "sim",
        ));

        assert_eq!(rx1.recv().await.unwrap().action, AlertAction::FireRecovery);
        assert_eq!(rx2.recv().await.unwrap().action, AlertAction::FireRecovery);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(AlertEvent::new(
            AlertAction::FireCritical,
            AlertField::Soil,
            1.0,
            "orphan",
        ));
    }
}

//! Alert notifier service.
//!
//! [`AlertNotifier`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and turns threshold transitions into push notifications. It runs on its
//! own task so a slow or unreachable push endpoint never delays relay
//! fan-out. Delivery failures are logged and dropped; the hub's alert flag
//! has already flipped and is never rolled back.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use farmlink_core::alert::AlertAction;

use crate::bus::AlertEvent;
use crate::delivery::push::{PushConfig, PushDelivery, PushError, PushMessage};

/// What happened to a single notification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// No outbound call for this action.
    Skipped,
    Delivered,
    /// The attempt was made and failed (already logged).
    Failed,
}

pub struct AlertNotifier {
    delivery: PushDelivery,
    config: PushConfig,
}

impl AlertNotifier {
    pub fn new(config: PushConfig) -> Result<Self, PushError> {
        Ok(Self {
            delivery: PushDelivery::new()?,
            config,
        })
    }

    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    /// Message to send for an action, if any.
    pub fn message_for(&self, action: AlertAction) -> Option<PushMessage> {
        match action {
            AlertAction::FireCritical => Some(PushMessage::critical(&self.config.click_url)),
            AlertAction::FireRecovery if self.config.notify_on_recovery => {
                Some(PushMessage::recovery(&self.config.click_url))
            }
            AlertAction::FireRecovery | AlertAction::None => None,
        }
    }

    /// Best-effort delivery of the notification for `action`.
    pub async fn notify(&self, action: AlertAction) -> NotifyOutcome {
        let Some(message) = self.message_for(action) else {
            if action == AlertAction::FireRecovery {
                tracing::info!("Soil recovered, alert reset");
            }
            return NotifyOutcome::Skipped;
        };

        tracing::info!(?action, endpoint = %self.config.endpoint, "Sending push notification");

        match self.delivery.send(&self.config.endpoint, &message).await {
            Ok(()) => {
                tracing::info!(?action, "Push notification delivered");
                NotifyOutcome::Delivered
            }
            Err(e) => {
                tracing::error!(?action, error = %e, "Failed to send push notification");
                NotifyOutcome::Failed
            }
        }
    }

    /// Run the notifier loop until the bus closes or `cancel` fires.
    pub async fn run(self, mut receiver: broadcast::Receiver<AlertEvent>, cancel: CancellationToken) {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Alert notifier stopping");
                    break;
                }
                received = receiver.recv() => received,
            };

            match event {
                Ok(event) => {
                    tracing::debug!(
                        action = ?event.action,
                        field = %event.field,
                        value = event.value,
                        source_peer = %event.source_peer,
                        "Alert event received"
                    );
                    self.notify(event.action).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Alert notifier lagged, some alerts were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, alert notifier shutting down");
                    break;
                }
            }
        }
    }
}

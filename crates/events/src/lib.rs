//! farmlink alert event bus and push notification delivery.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. The relay hub publishes threshold
//!   transitions here so that no network I/O happens on the fan-out path.
//! - [`AlertEvent`] -- a single threshold transition.
//! - [`delivery`] -- the outbound push channel (ntfy-style HTTP POST).
//! - [`AlertNotifier`] -- background service turning alert events into
//!   push notifications.

pub mod bus;
pub mod delivery;
pub mod notifier;

pub use bus::{AlertEvent, EventBus};
pub use delivery::push::{PushConfig, PushDelivery, PushError, PushMessage};
pub use notifier::{AlertNotifier, NotifyOutcome};

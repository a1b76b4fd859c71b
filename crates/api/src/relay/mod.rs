//! Event relay: fan-out between peers plus the alert flag.

mod hub;

pub use hub::{RelayHub, RelayOutcome};

//! Simulated farm used when no physical device is attached.
//!
//! [`Farm`] holds the zones, the pump and the weather forecast and applies
//! the per-tick decay and auto-watering rules. Timing (tick period, the
//! watering interval) is owned by the async engine in `farmlink-simulator`;
//! everything here is synchronous and driven by an injected RNG.

pub mod command;
pub mod farm;
pub mod pump;
pub mod zone;

pub use command::SimCommand;
pub use farm::{Farm, FarmSnapshot, StatusColor, StatusLine, TickOutcome, Weather};
pub use pump::{PumpPower, PumpState};
pub use zone::{PlantZone, ZoneStatus};

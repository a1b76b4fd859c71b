//! Well-known event names and telemetry keys used on the relay channel.
//!
//! Browser-facing command names are translated 1:1 to device-facing names
//! by [`CommandTable`](crate::protocol::CommandTable) before fan-out.

/// Telemetry packet pushed by a device or the simulator.
pub const EVENT_TELEMETRY_UPDATE: &str = "telemetry_update";

/// Transport lifecycle pseudo-events. Logged, never rebroadcast.
pub const EVENT_CONNECT: &str = "connect";
pub const EVENT_DISCONNECT: &str = "disconnect";

/// Prefix shared by all operator-initiated commands.
pub const COMMAND_PREFIX: &str = "command_";

pub const COMMAND_WATER: &str = "command_water";
pub const COMMAND_FORCE_START: &str = "command_force_start";
pub const COMMAND_FORCE_STOP: &str = "command_force_stop";
pub const COMMAND_SET_AUTO: &str = "command_set_auto";

pub const SIM_WATER_PLANT: &str = "sim_water_plant";
pub const SIM_FORCE_START: &str = "sim_force_start";
pub const SIM_FORCE_STOP: &str = "sim_force_stop";
pub const SIM_SET_AUTO: &str = "sim_set_auto";

/// Single-sensor soil moisture reading.
pub const FIELD_SOIL: &str = "soil";

/// Soil moisture averaged across all zones.
pub const FIELD_SOIL_AVG: &str = "soil_avg";

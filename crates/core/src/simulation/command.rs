//! Operator commands as seen by the telemetry source.

use serde::Deserialize;

use crate::event_names::{SIM_FORCE_START, SIM_FORCE_STOP, SIM_SET_AUTO, SIM_WATER_PLANT};
use crate::protocol::Frame;

/// A device-facing command the simulator acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCommand {
    /// Water one zone. `plant` is `None` when the payload did not name one.
    WaterPlant { plant: Option<String> },
    ForceStart,
    ForceStop,
    SetAuto,
}

#[derive(Debug, Default, Deserialize)]
struct WaterPayload {
    #[serde(default)]
    plant: Option<String>,
}

impl SimCommand {
    /// Decode a relayed frame.
    ///
    /// Returns `None` for events that are not simulator commands (for
    /// example telemetry rebroadcast by another device). Payload fields are
    /// read leniently: a malformed body decodes to a command that is a no-op.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        match frame.event.as_str() {
            SIM_WATER_PLANT => {
                let payload: WaterPayload =
                    serde_json::from_value(frame.data.clone()).unwrap_or_default();
                Some(SimCommand::WaterPlant {
                    plant: payload.plant,
                })
            }
            SIM_FORCE_START => Some(SimCommand::ForceStart),
            SIM_FORCE_STOP => Some(SimCommand::ForceStop),
            SIM_SET_AUTO => Some(SimCommand::SetAuto),
            _ => None,
        }
    }

    /// Whether the command takes the pump out of (or back into) automatic
    /// control.
    pub fn is_pump_override(&self) -> bool {
        !matches!(self, SimCommand::WaterPlant { .. })
    }
}

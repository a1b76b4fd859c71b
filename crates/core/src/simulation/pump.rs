use serde::Serialize;

/// Pump power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PumpPower {
    On,
    Off,
}

/// The irrigation pump plus its own sensor telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PumpState {
    pub state: PumpPower,
    /// Why the pump is in its current state.
    pub reason: String,
    /// Motor temperature in degrees Celsius.
    pub temp: i32,
    /// Line pressure in bar.
    pub pressure: f64,
    /// Set by operator commands; suppresses automatic transitions.
    pub manual_override: bool,
}

impl PumpState {
    pub fn is_on(&self) -> bool {
        self.state == PumpPower::On
    }

    pub fn switch_on(&mut self, reason: impl Into<String>) {
        self.state = PumpPower::On;
        self.reason = reason.into();
    }

    pub fn switch_off(&mut self, reason: impl Into<String>) {
        self.state = PumpPower::Off;
        self.reason = reason.into();
    }
}

impl Default for PumpState {
    fn default() -> Self {
        Self {
            state: PumpPower::Off,
            reason: "idle".to_string(),
            temp: 30,
            pressure: 1.5,
            manual_override: false,
        }
    }
}

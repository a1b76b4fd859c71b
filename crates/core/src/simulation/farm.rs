//! Farm state and the per-tick simulation rules.

use rand::Rng;
use serde::Serialize;

use super::command::SimCommand;
use super::pump::PumpState;
use super::zone::{PlantZone, ZoneStatus, MAX_DECAY_PER_TICK};

/// Pump motor temperature range resampled each tick (inclusive).
const PUMP_TEMP_RANGE: (i32, i32) = (25, 35);

/// Pump line pressure range resampled each tick, in bar.
const PUMP_PRESSURE_RANGE: (f64, f64) = (1.0, 2.5);

pub const REASON_IDLE: &str = "idle";
pub const REASON_AUTO_WATERING: &str = "auto watering";
pub const REASON_MANUAL_START: &str = "manual start";
pub const REASON_MANUAL_STOP: &str = "manual stop";
pub const REASON_AUTOMATIC: &str = "automatic control";

// ---------------------------------------------------------------------------
// Weather / status line
// ---------------------------------------------------------------------------

/// Static weather forecast shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weather {
    pub forecast: String,
    pub temperature: i32,
    /// Chance of rain, percent.
    pub rain_chance: u8,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            forecast: "Sunny".to_string(),
            temperature: 29,
            rain_chance: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Blue,
    Yellow,
    Red,
    Green,
}

/// One-line summary of the farm for the dashboard header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub message: String,
    pub color: StatusColor,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Telemetry packet emitted by the simulator as `telemetry_update`.
#[derive(Debug, Clone, Serialize)]
pub struct FarmSnapshot {
    pub weather: Weather,
    pub pump: PumpState,
    pub zones: Vec<PlantZone>,
    pub status: StatusLine,
    /// Mean humidity across all zones; omitted when there are none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_avg: Option<f64>,
}

impl FarmSnapshot {
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("FarmSnapshot is always serialisable")
    }
}

// ---------------------------------------------------------------------------
// Farm
// ---------------------------------------------------------------------------

/// Result of one simulation tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No automatic pump transition.
    Steady,
    /// The pump was switched on automatically and these zones were watered.
    /// The caller owns the watering interval and must call
    /// [`Farm::finish_watering`] when it elapses.
    WateringStarted { zones: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct Farm {
    zones: Vec<PlantZone>,
    pump: PumpState,
    weather: Weather,
}

impl Farm {
    pub fn new(zones: Vec<PlantZone>) -> Self {
        Self {
            zones,
            pump: PumpState::default(),
            weather: Weather::default(),
        }
    }

    pub fn zones(&self) -> &[PlantZone] {
        &self.zones
    }

    pub fn zone_mut(&mut self, name: &str) -> Option<&mut PlantZone> {
        self.zones.iter_mut().find(|z| z.name == name)
    }

    pub fn pump(&self) -> &PumpState {
        &self.pump
    }

    /// Advance the simulation by one period.
    ///
    /// 1. With the pump off, every zone loses 0..=2 humidity.
    /// 2. Outside manual override, critical zones switch the pump on and
    ///    are watered immediately.
    /// 3. Pump telemetry is resampled.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> TickOutcome {
        if !self.pump.is_on() {
            for zone in &mut self.zones {
                zone.decay(rng.random_range(0..=MAX_DECAY_PER_TICK));
            }
        }

        let outcome = self.auto_water();
        self.resample_pump(rng);
        outcome
    }

    fn auto_water(&mut self) -> TickOutcome {
        if self.pump.manual_override || self.pump.is_on() {
            return TickOutcome::Steady;
        }

        let mut watered = Vec::new();
        for zone in self.zones.iter_mut().filter(|z| z.is_critical()) {
            zone.water();
            watered.push(zone.name.clone());
        }

        if watered.is_empty() {
            return TickOutcome::Steady;
        }

        self.pump.switch_on(REASON_AUTO_WATERING);
        TickOutcome::WateringStarted { zones: watered }
    }

    fn resample_pump<R: Rng>(&mut self, rng: &mut R) {
        self.pump.temp = rng.random_range(PUMP_TEMP_RANGE.0..=PUMP_TEMP_RANGE.1);
        let pressure = rng.random_range(PUMP_PRESSURE_RANGE.0..=PUMP_PRESSURE_RANGE.1);
        self.pump.pressure = (pressure * 10.0).round() / 10.0;
    }

    /// End an automatic watering interval.
    ///
    /// Switches the pump off unless an operator has taken manual control in
    /// the meantime. Returns `true` if the pump state changed.
    pub fn finish_watering(&mut self) -> bool {
        if self.pump.manual_override || !self.pump.is_on() {
            return false;
        }
        self.pump.switch_off(REASON_IDLE);
        true
    }

    /// Apply an operator command immediately.
    ///
    /// Returns `true` if the farm changed and a fresh snapshot should be
    /// emitted.
    pub fn apply(&mut self, command: &SimCommand) -> bool {
        match command {
            SimCommand::WaterPlant { plant } => {
                let Some(zone) = plant.as_deref().and_then(|name| self.zone_mut(name)) else {
                    return false;
                };
                zone.water();
                true
            }
            SimCommand::ForceStart => {
                self.pump.switch_on(REASON_MANUAL_START);
                self.pump.manual_override = true;
                true
            }
            SimCommand::ForceStop => {
                self.pump.switch_off(REASON_MANUAL_STOP);
                self.pump.manual_override = true;
                true
            }
            SimCommand::SetAuto => {
                self.pump.switch_off(REASON_AUTOMATIC);
                self.pump.manual_override = false;
                true
            }
        }
    }

    fn zones_with(&self, status: ZoneStatus) -> Vec<&str> {
        self.zones
            .iter()
            .filter(|z| z.status == status)
            .map(|z| z.name.as_str())
            .collect()
    }

    /// Composite status. Precedence: pump on, warning zones, critical
    /// zones, all good.
    pub fn status_line(&self) -> StatusLine {
        if self.pump.is_on() {
            return StatusLine {
                message: "Watering in progress".to_string(),
                color: StatusColor::Blue,
            };
        }

        let warning = self.zones_with(ZoneStatus::Warning);
        if !warning.is_empty() {
            return StatusLine {
                message: format!("Needs water soon: {}", warning.join(", ")),
                color: StatusColor::Yellow,
            };
        }

        let critical = self.zones_with(ZoneStatus::Critical);
        if !critical.is_empty() {
            return StatusLine {
                message: format!("Critically dry: {}", critical.join(", ")),
                color: StatusColor::Red,
            };
        }

        StatusLine {
            message: "All plants are sufficiently watered".to_string(),
            color: StatusColor::Green,
        }
    }

    /// Mean zone humidity, rounded to one decimal. `None` with no zones.
    pub fn soil_avg(&self) -> Option<f64> {
        if self.zones.is_empty() {
            return None;
        }
        let total: u32 = self.zones.iter().map(|z| u32::from(z.humidity)).sum();
        let avg = f64::from(total) / self.zones.len() as f64;
        Some((avg * 10.0).round() / 10.0)
    }

    pub fn snapshot(&self) -> FarmSnapshot {
        FarmSnapshot {
            weather: self.weather.clone(),
            pump: self.pump.clone(),
            zones: self.zones.clone(),
            status: self.status_line(),
            soil_avg: self.soil_avg(),
        }
    }
}

impl Default for Farm {
    fn default() -> Self {
        Self::new(vec![
            PlantZone::new("tomato", 62, 1.2, 24),
            PlantZone::new("pepper", 58, 1.4, 26),
            PlantZone::new("olive", 70, 0.9, 23),
        ])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::simulation::pump::PumpPower;
    use crate::simulation::zone::HUMIDITY_FLOOR;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn farm_with(humidity: &[(&str, u8)]) -> Farm {
        Farm::new(
            humidity
                .iter()
                .map(|(name, h)| PlantZone::new(*name, *h, 1.0, 24))
                .collect(),
        )
    }

    #[test]
    fn tick_decays_by_at_most_two_and_respects_floor() {
        let mut rng = rng();
        let mut farm = farm_with(&[("tomato", 70), ("pepper", 21), ("olive", 56)]);
        // Keep the pump off so every tick is a pure decay step.
        farm.apply(&SimCommand::ForceStop);

        for _ in 0..40 {
            let before: Vec<u8> = farm.zones().iter().map(|z| z.humidity).collect();
            farm.tick(&mut rng);
            for (zone, prev) in farm.zones().iter().zip(before) {
                assert!(zone.humidity <= prev, "{} rose without watering", zone.name);
                assert!(prev - zone.humidity <= MAX_DECAY_PER_TICK);
                assert!(zone.humidity >= HUMIDITY_FLOOR);
                assert_eq!(zone.status, ZoneStatus::from_humidity(zone.humidity));
            }
        }
    }

    #[test]
    fn critical_zone_is_watered_in_same_tick() {
        let mut farm = farm_with(&[("tomato", 35), ("olive", 80)]);

        let outcome = farm.tick(&mut rng());

        assert_eq!(
            outcome,
            TickOutcome::WateringStarted {
                zones: vec!["tomato".to_string()]
            }
        );
        let tomato = &farm.zones()[0];
        assert!((63..=65).contains(&tomato.humidity), "got {}", tomato.humidity);
        assert_eq!(tomato.status, ZoneStatus::Ok);
        assert!(farm.pump().is_on());
        assert_eq!(farm.pump().reason, REASON_AUTO_WATERING);
    }

    #[test]
    fn no_decay_while_pump_is_on() {
        let mut farm = farm_with(&[("tomato", 60)]);
        farm.apply(&SimCommand::ForceStart);
        farm.tick(&mut rng());
        assert_eq!(farm.zones()[0].humidity, 60);
    }

    #[test]
    fn finish_watering_switches_pump_off() {
        let mut farm = farm_with(&[("tomato", 30)]);
        farm.tick(&mut rng());
        assert!(farm.pump().is_on());

        assert!(farm.finish_watering());
        assert_eq!(farm.pump().state, PumpPower::Off);
        assert_eq!(farm.pump().reason, REASON_IDLE);
        assert!(!farm.finish_watering(), "second call is a no-op");
    }

    #[test]
    fn finish_watering_respects_manual_takeover() {
        let mut farm = farm_with(&[("tomato", 30)]);
        farm.tick(&mut rng());
        farm.apply(&SimCommand::ForceStart);

        assert!(!farm.finish_watering());
        assert!(farm.pump().is_on());
    }

    #[test]
    fn manual_stop_locks_out_auto_start_until_set_auto() {
        let mut rng = rng();
        let mut farm = farm_with(&[("tomato", 25)]);
        farm.apply(&SimCommand::ForceStop);

        for _ in 0..5 {
            assert_eq!(farm.tick(&mut rng), TickOutcome::Steady);
            assert!(!farm.pump().is_on());
        }
        assert!(farm.zones()[0].is_critical());

        farm.apply(&SimCommand::SetAuto);
        assert!(!farm.pump().manual_override);
        assert_ne!(farm.tick(&mut rng), TickOutcome::Steady);
        assert!(farm.pump().is_on());
    }

    #[test]
    fn force_start_and_stop_set_override() {
        let mut farm = Farm::default();

        assert!(farm.apply(&SimCommand::ForceStart));
        assert!(farm.pump().is_on());
        assert!(farm.pump().manual_override);
        assert_eq!(farm.pump().reason, REASON_MANUAL_START);

        assert!(farm.apply(&SimCommand::ForceStop));
        assert!(!farm.pump().is_on());
        assert!(farm.pump().manual_override);
        assert_eq!(farm.pump().reason, REASON_MANUAL_STOP);
    }

    #[test]
    fn water_plant_targets_named_zone() {
        let mut farm = farm_with(&[("tomato", 45), ("pepper", 45)]);

        assert!(farm.apply(&SimCommand::WaterPlant {
            plant: Some("pepper".to_string())
        }));
        assert_eq!(farm.zones()[0].humidity, 45);
        assert_eq!(farm.zones()[1].humidity, 75);
        assert_eq!(farm.zones()[1].status, ZoneStatus::Ok);
    }

    #[test]
    fn water_plant_unknown_or_missing_zone_is_noop() {
        let mut farm = Farm::default();
        let before = farm.snapshot().to_value();

        assert!(!farm.apply(&SimCommand::WaterPlant {
            plant: Some("banana".to_string())
        }));
        assert!(!farm.apply(&SimCommand::WaterPlant { plant: None }));
        assert_eq!(farm.snapshot().to_value(), before);
    }

    #[test]
    fn pump_telemetry_resampled_within_ranges() {
        let mut rng = rng();
        let mut farm = Farm::default();
        for _ in 0..50 {
            farm.tick(&mut rng);
            let pump = farm.pump();
            assert!((25..=35).contains(&pump.temp));
            assert!((1.0..=2.5).contains(&pump.pressure));
            farm.finish_watering();
        }
    }

    #[test]
    fn status_line_precedence() {
        let mut farm = farm_with(&[("tomato", 80), ("pepper", 80)]);
        assert_eq!(farm.status_line().color, StatusColor::Green);

        let mut farm_mixed = farm_with(&[("tomato", 30), ("pepper", 50)]);
        let line = farm_mixed.status_line();
        assert_eq!(line.color, StatusColor::Yellow, "warning outranks critical");
        assert_eq!(line.message, "Needs water soon: pepper");

        let farm_critical = farm_with(&[("tomato", 30), ("pepper", 80)]);
        let line = farm_critical.status_line();
        assert_eq!(line.color, StatusColor::Red);
        assert_eq!(line.message, "Critically dry: tomato");

        farm.apply(&SimCommand::ForceStart);
        assert_eq!(farm.status_line().color, StatusColor::Blue);
        farm_mixed.apply(&SimCommand::ForceStart);
        assert_eq!(farm_mixed.status_line().color, StatusColor::Blue);
    }

    #[test]
    fn snapshot_shape() {
        let farm = farm_with(&[("tomato", 60), ("pepper", 45)]);
        let value = farm.snapshot().to_value();

        assert_eq!(value["soil_avg"], 52.5);
        assert_eq!(value["pump"]["state"], "OFF");
        assert_eq!(value["pump"]["manual_override"], false);
        assert_eq!(value["zones"][0]["name"], "tomato");
        assert_eq!(value["zones"][1]["status"], "Warning");
        assert_eq!(value["status"]["color"], "yellow");
        assert!(value["weather"]["forecast"].is_string());
    }

    #[test]
    fn empty_farm_has_no_soil_avg() {
        let farm = Farm::new(Vec::new());
        assert_eq!(farm.soil_avg(), None);

        let value = farm.snapshot().to_value();
        assert!(value.get("soil_avg").is_none(), "key must be omitted, got {value}");
    }
}

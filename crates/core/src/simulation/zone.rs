use serde::Serialize;

/// Humidity below which a zone is critical.
pub const CRITICAL_HUMIDITY: u8 = 40;

/// Humidity below which a zone needs attention soon.
pub const WARNING_HUMIDITY: u8 = 55;

/// Decay never takes humidity below this floor.
pub const HUMIDITY_FLOOR: u8 = 20;

pub const HUMIDITY_MAX: u8 = 100;

/// Largest humidity drop applied in one tick.
pub const MAX_DECAY_PER_TICK: u8 = 2;

/// Humidity added when a zone is watered.
pub const WATERING_BOOST: u8 = 30;

/// Moisture status derived from humidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZoneStatus {
    #[serde(rename = "OK")]
    Ok,
    Warning,
    Critical,
}

impl ZoneStatus {
    pub fn from_humidity(humidity: u8) -> Self {
        if humidity < CRITICAL_HUMIDITY {
            ZoneStatus::Critical
        } else if humidity < WARNING_HUMIDITY {
            ZoneStatus::Warning
        } else {
            ZoneStatus::Ok
        }
    }
}

/// One independently monitored planting area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantZone {
    pub name: String,
    /// Soil humidity, 0-100.
    pub humidity: u8,
    pub salinity: f64,
    /// Soil temperature in degrees Celsius.
    pub temperature: i32,
    pub status: ZoneStatus,
}

impl PlantZone {
    pub fn new(name: impl Into<String>, humidity: u8, salinity: f64, temperature: i32) -> Self {
        let humidity = humidity.min(HUMIDITY_MAX);
        Self {
            name: name.into(),
            humidity,
            salinity,
            temperature,
            status: ZoneStatus::from_humidity(humidity),
        }
    }

    /// Lower humidity by `amount`, never below [`HUMIDITY_FLOOR`], and
    /// recompute the status.
    pub fn decay(&mut self, amount: u8) {
        self.humidity = self.humidity.saturating_sub(amount).max(HUMIDITY_FLOOR);
        self.status = ZoneStatus::from_humidity(self.humidity);
    }

    /// Add [`WATERING_BOOST`] to humidity and reset the status to OK.
    pub fn water(&mut self) {
        self.humidity = self.humidity.saturating_add(WATERING_BOOST).min(HUMIDITY_MAX);
        self.status = ZoneStatus::Ok;
    }

    pub fn is_critical(&self) -> bool {
        self.status == ZoneStatus::Critical
    }
}

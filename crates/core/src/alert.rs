//! Alert types for soil moisture threshold transitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::event_names::{FIELD_SOIL, FIELD_SOIL_AVG};

/// Outcome of a single threshold evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertAction {
    /// Nothing to do.
    None,
    /// Value dropped below the critical threshold while no alert was active.
    FireCritical,
    /// Value climbed back above the recovery threshold while alerting.
    FireRecovery,
}

impl AlertAction {
    pub fn is_none(self) -> bool {
        self == AlertAction::None
    }
}

/// Which telemetry key drives alerting. Exactly one is active per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertField {
    /// Single-sensor reading (`soil`).
    #[default]
    Soil,
    /// Average across zones (`soil_avg`).
    SoilAvg,
}

impl AlertField {
    /// The JSON key looked up in a telemetry packet.
    pub fn key(self) -> &'static str {
        match self {
            AlertField::Soil => FIELD_SOIL,
            AlertField::SoilAvg => FIELD_SOIL_AVG,
        }
    }
}

impl fmt::Display for AlertField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AlertField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            FIELD_SOIL => Ok(AlertField::Soil),
            FIELD_SOIL_AVG => Ok(AlertField::SoilAvg),
            other => Err(CoreError::Validation(format!(
                "alert field must be '{FIELD_SOIL}' or '{FIELD_SOIL_AVG}', got '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_fields() {
        assert_eq!("soil".parse::<AlertField>().unwrap(), AlertField::Soil);
        assert_eq!(" soil_avg ".parse::<AlertField>().unwrap(), AlertField::SoilAvg);
        assert!("humidity".parse::<AlertField>().is_err());
    }

    #[test]
    fn action_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(AlertAction::FireCritical).unwrap(),
            "fire_critical"
        );
        assert_eq!(
            serde_json::to_value(AlertAction::FireRecovery).unwrap(),
            "fire_recovery"
        );
    }
}

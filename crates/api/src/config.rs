use axum::http::HeaderValue;
use farmlink_core::alert::AlertField;
use farmlink_core::alerting::thresholds::{
    ThresholdConfig, DEFAULT_CRITICAL_THRESHOLD, DEFAULT_HYSTERESIS_MARGIN,
};
use farmlink_core::error::CoreError;
use farmlink_events::PushConfig;
use farmlink_simulator::EngineConfig;

use crate::mqtt::{MqttConfig, DEFAULT_MQTT_PORT, DEFAULT_MQTT_TOPIC};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Alert field and hysteresis band.
    pub thresholds: ThresholdConfig,
    /// Push endpoint and deep link.
    pub push: PushConfig,
    /// In-process simulator timing; `None` when `SIMULATOR_ENABLED` is off.
    pub simulator: Option<EngineConfig>,
    /// Broker subscription; `None` when `MQTT_BROKER` is unset.
    pub mqtt: Option<MqttConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                                   |
    /// |----------------------------|-------------------------------------------|
    /// | `HOST`                     | `0.0.0.0`                                 |
    /// | `PORT`                     | `8080`                                    |
    /// | `CORS_ORIGINS`             | `http://localhost:8080`                   |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                                      |
    /// | `ALERT_FIELD`              | `soil_avg` with the simulator, else `soil` |
    /// | `ALERT_CRITICAL_THRESHOLD` | `30`                                      |
    /// | `ALERT_HYSTERESIS_MARGIN`  | `10`                                      |
    /// | `SIMULATOR_ENABLED`        | `false`                                   |
    /// | `MQTT_BROKER`              | unset (MQTT ingestion off)                |
    /// | `MQTT_PORT`                | `1883`                                    |
    /// | `MQTT_TOPIC`               | `farmlink/telemetry`                      |
    /// | `MQTT_CLIENT_ID`           | `farmlink-hub-<random>`                   |
    ///
    /// Push settings are read by [`PushConfig::from_env`] and simulator
    /// timing by [`EngineConfig::from_env`].
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port: u16 = parse_var(&lookup, "PORT", 8080)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:8080".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|_| {
                CoreError::Validation(format!("CORS_ORIGINS has an invalid origin: '{origin}'"))
            })?;
        }

        let request_timeout_secs: u64 = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;

        let simulator = if parse_var(&lookup, "SIMULATOR_ENABLED", false)? {
            Some(EngineConfig::from_lookup(&lookup)?)
        } else {
            None
        };

        // Simulated packets only carry the zone average.
        let default_field = if simulator.is_some() {
            AlertField::SoilAvg
        } else {
            AlertField::Soil
        };
        let thresholds = ThresholdConfig {
            field: parse_var(&lookup, "ALERT_FIELD", default_field)?,
            critical_threshold: parse_var(
                &lookup,
                "ALERT_CRITICAL_THRESHOLD",
                DEFAULT_CRITICAL_THRESHOLD,
            )?,
            hysteresis_margin: parse_var(
                &lookup,
                "ALERT_HYSTERESIS_MARGIN",
                DEFAULT_HYSTERESIS_MARGIN,
            )?,
        };
        thresholds.validate()?;

        let mqtt = match lookup("MQTT_BROKER").filter(|b| !b.trim().is_empty()) {
            Some(broker) => Some(MqttConfig {
                host: broker.trim().to_string(),
                port: parse_var(&lookup, "MQTT_PORT", DEFAULT_MQTT_PORT)?,
                topic: lookup("MQTT_TOPIC").unwrap_or_else(|| DEFAULT_MQTT_TOPIC.into()),
                client_id: lookup("MQTT_CLIENT_ID").unwrap_or_else(|| {
                    format!("farmlink-hub-{}", uuid::Uuid::new_v4().simple())
                }),
            }),
            None => None,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            thresholds,
            push: PushConfig::from_lookup(&lookup)?,
            simulator,
            mqtt,
        })
    }
}

/// Parse an optional variable, falling back to `default` when it is unset.
/// A set but unparsable value is a configuration error.
fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, CoreError> {
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{var} has an invalid value: '{raw}'"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, CoreError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|var| map.get(var).cloned())
    }

    #[test]
    fn defaults_without_any_variables() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, vec!["http://localhost:8080".to_string()]);
        assert_eq!(config.thresholds, ThresholdConfig::default());
        assert!(config.simulator.is_none());
        assert!(config.mqtt.is_none());
        assert!(!config.push.notify_on_recovery);
    }

    #[test]
    fn garbage_port_is_rejected() {
        assert_matches!(load(&[("PORT", "eighty")]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn negative_margin_is_rejected() {
        assert_matches!(
            load(&[("ALERT_HYSTERESIS_MARGIN", "-5")]),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn unparsable_recovery_flag_fails_startup() {
        assert_matches!(
            load(&[("ALERT_NOTIFY_ON_RECOVERY", "yes")]),
            Err(CoreError::Validation(msg)) if msg.contains("ALERT_NOTIFY_ON_RECOVERY")
        );
        assert!(load(&[("ALERT_NOTIFY_ON_RECOVERY", "true")]).unwrap().push.notify_on_recovery);
    }

    #[test]
    fn simulator_switches_default_field_to_soil_avg() {
        let config = load(&[("SIMULATOR_ENABLED", "true")]).unwrap();
        assert!(config.simulator.is_some());
        assert_eq!(config.thresholds.field, AlertField::SoilAvg);
    }

    #[test]
    fn explicit_field_wins_over_simulator_default() {
        let config = load(&[("SIMULATOR_ENABLED", "true"), ("ALERT_FIELD", "soil")]).unwrap();
        assert_eq!(config.thresholds.field, AlertField::Soil);
    }

    #[test]
    fn mqtt_enabled_by_broker() {
        let config = load(&[("MQTT_BROKER", "broker.local"), ("MQTT_TOPIC", "farm/status")]).unwrap();
        let mqtt = config.mqtt.expect("broker set");
        assert_eq!(mqtt.host, "broker.local");
        assert_eq!(mqtt.port, 1883);
        assert_eq!(mqtt.topic, "farm/status");
        assert!(mqtt.client_id.starts_with("farmlink-hub-"));
    }

    #[test]
    fn bad_mqtt_port_is_rejected() {
        assert_matches!(
            load(&[("MQTT_BROKER", "broker.local"), ("MQTT_PORT", "99999")]),
            Err(CoreError::Validation(_))
        );
    }
}

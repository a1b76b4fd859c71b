//! Hysteresis threshold evaluation for telemetry packets.
//!
//! Pure logic. The caller holds the "alert active" flag and applies the
//! returned state atomically.

use serde_json::Value;

use crate::alert::{AlertAction, AlertField};
use crate::error::CoreError;

/// Default critical threshold for soil moisture.
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 30.0;

/// Default width of the hysteresis band above the critical threshold.
pub const DEFAULT_HYSTERESIS_MARGIN: f64 = 10.0;

/// Evaluator configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    pub field: AlertField,
    pub critical_threshold: f64,
    pub hysteresis_margin: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            field: AlertField::Soil,
            critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
            hysteresis_margin: DEFAULT_HYSTERESIS_MARGIN,
        }
    }
}

impl ThresholdConfig {
    /// Reject configurations that would make the state machine meaningless.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.critical_threshold.is_finite() {
            return Err(CoreError::Validation(
                "critical threshold must be a finite number".to_string(),
            ));
        }
        if !self.hysteresis_margin.is_finite() || self.hysteresis_margin < 0.0 {
            return Err(CoreError::Validation(format!(
                "hysteresis margin must be a non-negative number, got {}",
                self.hysteresis_margin
            )));
        }
        Ok(())
    }

    /// Value above which an active alert recovers.
    pub fn recovery_threshold(&self) -> f64 {
        self.critical_threshold + self.hysteresis_margin
    }

    /// Read the configured alert field from a packet.
    ///
    /// Returns `None` when the packet is not an object, the key is missing,
    /// or the value is not numeric.
    pub fn read(&self, payload: &Value) -> Option<f64> {
        payload.get(self.field.key()).and_then(Value::as_f64)
    }

    /// Decide the next alert state for a packet.
    ///
    /// Returns `(new_alert_active, action)`. A packet without a usable
    /// reading never changes state.
    pub fn evaluate(&self, payload: &Value, alert_active: bool) -> (bool, AlertAction) {
        match self.read(payload) {
            Some(value) => self.evaluate_value(value, alert_active),
            None => (alert_active, AlertAction::None),
        }
    }

    /// Same as [`evaluate`](Self::evaluate) for an already extracted reading.
    pub fn evaluate_value(&self, value: f64, alert_active: bool) -> (bool, AlertAction) {
        if value < self.critical_threshold {
            if alert_active {
                (true, AlertAction::None)
            } else {
                (true, AlertAction::FireCritical)
            }
        } else if value > self.recovery_threshold() && alert_active {
            (false, AlertAction::FireRecovery)
        } else {
            (alert_active, AlertAction::None)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Soil moisture alerting domain logic.
//!
//! Contains the hysteresis threshold evaluator. All logic in this module is
//! pure (no I/O) so the state machine can be tested in isolation; the hub
//! owns the single process-wide alert flag.

pub mod thresholds;

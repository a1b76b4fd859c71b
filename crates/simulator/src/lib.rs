//! `farmlink-simulator` library crate.
//!
//! The [`engine`] drives a simulated farm on a timer and speaks the relay
//! frame protocol over channels. It is embedded by the API server when
//! `SIMULATOR_ENABLED` is set, and by the standalone binary, which bridges
//! the same channels to the hub's WebSocket via [`sender`].

pub mod engine;
pub mod sender;

pub use engine::{EngineConfig, SimulationEngine};

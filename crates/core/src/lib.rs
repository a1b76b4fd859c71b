//! Domain logic shared by the farmlink relay, notifier, and simulator.
//!
//! Everything in this crate is pure: no sockets, no timers, no HTTP. The
//! async crates feed values in and act on what comes back.

pub mod alert;
pub mod alerting;
pub mod error;
pub mod event_names;
pub mod protocol;
pub mod simulation;
pub mod types;

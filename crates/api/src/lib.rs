//! farmlink relay server library.
//!
//! Exposes the building blocks (config, state, relay hub, WebSocket
//! infrastructure, routes) so integration tests and the binary entrypoint
//! can both access them.

pub mod config;
pub mod error;
pub mod mqtt;
pub mod relay;
pub mod router;
pub mod routes;
pub mod simulation;
pub mod state;
pub mod ws;

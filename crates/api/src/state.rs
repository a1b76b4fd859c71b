use std::sync::Arc;

use crate::config::ServerConfig;
use crate::relay::RelayHub;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Event relay hub (owns the peer registry and the alert flag).
    pub hub: Arc<RelayHub>,
}

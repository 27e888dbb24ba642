use std::sync::Arc;

use scriptgate_core::gateway::Gateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Execution pipeline, shared with the gRPC front end.
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>, gateway: Arc<Gateway>) -> Self {
        Self { config, gateway }
    }
}

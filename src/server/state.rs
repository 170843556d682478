//! Shared server state.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::generation::GenerationService;

/// State shared across all request handlers.
///
/// Both members are built once at startup and only ever read afterwards;
/// cloning the state is two Arc bumps.
#[derive(Clone)]
pub struct AppState {
    /// The dependency-injected generation service.
    pub service: Arc<GenerationService>,
    /// Runtime configuration.
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Creates new server state.
    pub fn new(service: GenerationService, config: AppConfig) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }
}

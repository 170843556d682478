//! Router construction.

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use super::state::AppState;

/// Builds the application router with CORS restricted to the given origin.
pub fn build_router(state: AppState, allowed_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/generate", get(handlers::generate))
        .route("/ping", get(handlers::ping))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::Result;
    use crate::generation::{AudioGenerator, GenerationService, Waveform};

    struct StubBackend;

    impl AudioGenerator for StubBackend {
        fn generate(&mut self, prompts: &[String], _duration_sec: u32) -> Result<Vec<Waveform>> {
            Ok(prompts
                .iter()
                .map(|_| Waveform::mono(vec![0.0; 8], 32000))
                .collect())
        }

        fn sample_rate(&self) -> u32 {
            32000
        }

        fn model_version(&self) -> &str {
            "stub"
        }
    }

    #[test]
    fn router_builds_with_configured_origin() {
        let state = AppState::new(
            GenerationService::new(Box::new(StubBackend)),
            AppConfig::default(),
        );
        let origin = AppConfig::default().allowed_origin.parse().unwrap();
        let _router = build_router(state, origin);
    }
}

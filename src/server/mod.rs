//! HTTP server.
//!
//! Serves the generation endpoint over axum. The transport layer only
//! shuttles bytes: all audio knowledge lives in [`crate::audio`] and all
//! model knowledge behind [`crate::generation::GenerationService`].

pub mod handlers;
pub mod routes;
pub mod state;

pub use state::AppState;

use anyhow::Context;
use axum::http::HeaderValue;

use crate::config::AppConfig;
use crate::generation::GenerationService;

/// Binds the listener and serves requests until the process exits.
pub async fn start_server(config: AppConfig, service: GenerationService) -> anyhow::Result<()> {
    let origin: HeaderValue = config
        .allowed_origin
        .parse()
        .with_context(|| format!("invalid CORS origin: {}", config.allowed_origin))?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(service, config);
    let app = routes::build_router(state, origin);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(addr = %bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

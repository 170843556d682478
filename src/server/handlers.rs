//! HTTP request handlers.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::audio::wav::encode_waveform;
use crate::error::{Result, TonegenError};

use super::state::AppState;

/// Maximum accepted prompt length in bytes.
pub const MAX_PROMPT_LEN: usize = 1000;

/// Query parameters for the generate endpoint.
#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    /// Text description of the audio to generate.
    pub prompt: String,
}

/// `GET /generate?prompt=...`
///
/// Generates one clip for the prompt and streams it back as `audio/wav`.
/// Failures surface as JSON error payloads with their mapped status codes
/// via the [`TonegenError`] response impl.
pub async fn generate(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
) -> Result<Response> {
    validate_prompt(&query.prompt)?;

    tracing::info!(prompt = %query.prompt, "generation request");

    let clip = state
        .service
        .generate_clip(query.prompt, state.config.duration_sec)
        .await?;

    let bytes = encode_waveform(&clip)?;

    tracing::info!(
        bytes = bytes.len(),
        duration_sec = clip.duration_secs(),
        "clip encoded"
    );

    Ok(([(header::CONTENT_TYPE, "audio/wav")], bytes).into_response())
}

/// `GET /ping` liveness check.
pub async fn ping() -> Response {
    axum::Json(serde_json::json!({ "status": "ok" })).into_response()
}

/// Validates a prompt before any model work is queued.
fn validate_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(TonegenError::empty_prompt());
    }
    if prompt.len() > MAX_PROMPT_LEN {
        return Err(TonegenError::prompt_too_long(prompt.len()));
    }
    Ok(())
}

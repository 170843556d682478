//! Error types for tonegen.
//!
//! Defines all error codes and types used throughout the server and CLI,
//! and their mapping onto HTTP status codes at the transport boundary.

use std::fmt;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Error codes surfaced in error responses.
///
/// Each code maps to a distinct HTTP status so callers can handle failures
/// programmatically instead of parsing message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Prompt text is invalid.
    /// Trigger: empty prompt or longer than 1000 characters.
    InvalidPrompt,

    /// A waveform violated the encoder's input constraints.
    /// Trigger: empty sample buffer, zero sample rate or channel count,
    /// or a sample count that is not a whole number of frames.
    InvalidWaveform,

    /// Failed to serialize PCM samples into a WAV container.
    /// Trigger: container writer error (defensive; near-impossible with
    /// validated input).
    EncodingFailed,

    /// ONNX model files not found at the expected path.
    ModelNotFound,

    /// Failed to load an ONNX model into memory.
    /// Trigger: corrupt file, wrong format, or OOM during load.
    ModelLoadFailed,

    /// Failed to download model files from the remote source.
    ModelDownloadFailed,

    /// The upstream generation call failed.
    /// Trigger: inference error, or the backend returned the wrong number
    /// of clips for a batch.
    GenerationFailed,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPrompt => "INVALID_PROMPT",
            ErrorCode::InvalidWaveform => "INVALID_WAVEFORM",
            ErrorCode::EncodingFailed => "ENCODING_FAILED",
            ErrorCode::ModelNotFound => "MODEL_NOT_FOUND",
            ErrorCode::ModelLoadFailed => "MODEL_LOAD_FAILED",
            ErrorCode::ModelDownloadFailed => "MODEL_DOWNLOAD_FAILED",
            ErrorCode::GenerationFailed => "GENERATION_FAILED",
        }
    }

    /// Returns the HTTP status code this error is reported with.
    ///
    /// Every failure gets a non-success status; errors are never delivered
    /// inside a 200-shaped payload.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidPrompt => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidWaveform => StatusCode::BAD_REQUEST,
            ErrorCode::EncodingFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ModelNotFound => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ModelLoadFailed => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::ModelDownloadFailed => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::GenerationFailed => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns a human-readable description of the error condition.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPrompt => "Prompt must be non-empty and at most 1000 characters",
            ErrorCode::InvalidWaveform => {
                "Waveform must be non-empty with positive sample rate and channel count"
            }
            ErrorCode::EncodingFailed => "Failed to serialize audio into a WAV container",
            ErrorCode::ModelNotFound => "ONNX model files not found at the expected path",
            ErrorCode::ModelLoadFailed => "Failed to load ONNX model into memory",
            ErrorCode::ModelDownloadFailed => "Failed to download model files from remote source",
            ErrorCode::GenerationFailed => "Model inference failed during generation",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for tonegen operations.
#[derive(Debug)]
pub struct TonegenError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TonegenError {
    /// Creates a new TonegenError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new TonegenError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an INVALID_PROMPT error for empty prompts.
    pub fn empty_prompt() -> Self {
        Self::new(ErrorCode::InvalidPrompt, "Prompt cannot be empty")
    }

    /// Creates an INVALID_PROMPT error for prompts that are too long.
    pub fn prompt_too_long(len: usize) -> Self {
        Self::new(
            ErrorCode::InvalidPrompt,
            format!("Prompt too long: {} characters (maximum 1000)", len),
        )
    }

    /// Creates an INVALID_WAVEFORM error.
    pub fn invalid_waveform(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidWaveform,
            format!("Invalid waveform: {}", reason.into()),
        )
    }

    /// Creates an ENCODING_FAILED error.
    pub fn encoding_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::EncodingFailed,
            format!("Encoding failed: {}", reason.into()),
        )
    }

    /// Creates a MODEL_NOT_FOUND error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ModelNotFound,
            format!("Model files not found at: {}", path.into()),
        )
    }

    /// Creates a MODEL_LOAD_FAILED error.
    pub fn model_load_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ModelLoadFailed,
            format!("Failed to load model: {}", reason.into()),
        )
    }

    /// Creates a MODEL_DOWNLOAD_FAILED error.
    pub fn model_download_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ModelDownloadFailed,
            format!("Failed to download model: {}", reason.into()),
        )
    }

    /// Creates a GENERATION_FAILED error.
    pub fn generation_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GenerationFailed,
            format!("Generation failed: {}", reason.into()),
        )
    }
}

impl fmt::Display for TonegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for TonegenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl IntoResponse for TonegenError {
    /// Renders the error as a JSON payload with its distinct status code.
    ///
    /// Body shape: `{"error": {"code": "...", "message": "..."}}`.
    fn into_response(self) -> Response {
        let status = self.code.http_status();
        let body = serde_json::json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
            }
        });
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

/// Result type alias using TonegenError.
pub type Result<T> = std::result::Result<T, TonegenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_as_str() {
        assert_eq!(ErrorCode::InvalidPrompt.as_str(), "INVALID_PROMPT");
        assert_eq!(ErrorCode::InvalidWaveform.as_str(), "INVALID_WAVEFORM");
        assert_eq!(ErrorCode::EncodingFailed.as_str(), "ENCODING_FAILED");
        assert_eq!(ErrorCode::ModelNotFound.as_str(), "MODEL_NOT_FOUND");
        assert_eq!(ErrorCode::ModelLoadFailed.as_str(), "MODEL_LOAD_FAILED");
        assert_eq!(
            ErrorCode::ModelDownloadFailed.as_str(),
            "MODEL_DOWNLOAD_FAILED"
        );
        assert_eq!(ErrorCode::GenerationFailed.as_str(), "GENERATION_FAILED");
    }

    #[test]
    fn status_codes_never_report_success() {
        for code in [
            ErrorCode::InvalidPrompt,
            ErrorCode::InvalidWaveform,
            ErrorCode::EncodingFailed,
            ErrorCode::ModelNotFound,
            ErrorCode::ModelLoadFailed,
            ErrorCode::ModelDownloadFailed,
            ErrorCode::GenerationFailed,
        ] {
            assert!(!code.http_status().is_success(), "{} maps to 2xx", code);
        }
    }

    #[test]
    fn status_codes_by_failure_class() {
        assert_eq!(
            ErrorCode::InvalidPrompt.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::GenerationFailed.http_status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ErrorCode::ModelNotFound.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::EncodingFailed.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn descriptions_are_not_empty() {
        for code in [
            ErrorCode::InvalidPrompt,
            ErrorCode::InvalidWaveform,
            ErrorCode::EncodingFailed,
            ErrorCode::ModelNotFound,
            ErrorCode::ModelLoadFailed,
            ErrorCode::ModelDownloadFailed,
            ErrorCode::GenerationFailed,
        ] {
            assert!(!code.description().is_empty());
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = TonegenError::prompt_too_long(1200);
        assert!(err.to_string().contains("INVALID_PROMPT"));
        assert!(err.to_string().contains("1200"));
    }

    #[test]
    fn error_response_uses_mapped_status() {
        let response = TonegenError::empty_prompt().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = TonegenError::generation_failed("session error").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}

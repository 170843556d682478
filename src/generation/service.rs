//! Generation service handle.
//!
//! An explicitly constructed, dependency-injected wrapper around a loaded
//! [`AudioGenerator`], built once at startup and shared by reference with
//! every request handler. Replaces the module-level model globals of the
//! original design: init-once, no teardown, no hidden state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{Result, TonegenError};

use super::{AudioGenerator, Waveform};

/// Shared handle over a generation backend.
///
/// Inference is serialized through a mutex (the backend needs `&mut` for its
/// ONNX sessions) and runs on a blocking thread so in-flight HTTP requests
/// are not starved while the model works.
pub struct GenerationService {
    backend: Arc<Mutex<Box<dyn AudioGenerator>>>,
    sample_rate: u32,
    model_version: String,
}

impl GenerationService {
    /// Creates a service over a loaded backend.
    pub fn new(backend: Box<dyn AudioGenerator>) -> Self {
        let sample_rate = backend.sample_rate();
        let model_version = backend.model_version().to_string();
        Self {
            backend: Arc::new(Mutex::new(backend)),
            sample_rate,
            model_version,
        }
    }

    /// Returns the backend's output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the backend's model identifier.
    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Generates one waveform per prompt.
    ///
    /// Enforces the batch contract: the backend must return exactly one
    /// waveform per prompt. A mismatched count is a backend bug and is
    /// reported as a generation failure rather than silently dropping or
    /// duplicating clips.
    pub async fn generate_batch(
        &self,
        prompts: Vec<String>,
        duration_sec: u32,
    ) -> Result<Vec<Waveform>> {
        let expected = prompts.len();
        let backend = Arc::clone(&self.backend);

        let clips = tokio::task::spawn_blocking(move || {
            let mut backend = backend.blocking_lock();
            backend.generate(&prompts, duration_sec)
        })
        .await
        .map_err(|e| TonegenError::generation_failed(format!("generation task failed: {}", e)))??;

        if clips.len() != expected {
            return Err(TonegenError::generation_failed(format!(
                "backend returned {} clips for {} prompts",
                clips.len(),
                expected
            )));
        }

        Ok(clips)
    }

    /// Generates a single clip for a single prompt.
    ///
    /// This is the entry point the HTTP handler uses: it requests exactly one
    /// clip, so a response can never silently discard waveforms.
    pub async fn generate_clip(&self, prompt: String, duration_sec: u32) -> Result<Waveform> {
        let mut clips = self.generate_batch(vec![prompt], duration_sec).await?;
        clips
            .pop()
            .ok_or_else(|| TonegenError::generation_failed("backend returned no clips"))
    }
}

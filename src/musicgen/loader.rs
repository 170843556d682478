//! Model loading and the backend facade.
//!
//! Checks for the required ONNX files, builds the sessions, and assembles
//! [`MusicGenBackend`], the crate's [`AudioGenerator`] implementation.

use std::path::Path;

use ort::session::Session;

use crate::error::{Result, TonegenError};
use crate::generation::{AudioGenerator, Waveform};

use super::codec::AudioDecoder;
use super::config::ModelConfig;
use super::decoder::TokenDecoder;
use super::text::PromptEncoder;
use super::TOKENS_PER_SECOND;

/// Required model files for MusicGen.
pub const MODEL_FILES: &[&str] = &[
    "tokenizer.json",
    "text_encoder.onnx",
    "decoder_model.onnx",
    "decoder_with_past_model.onnx",
    "encodec_decode.onnx",
];

/// Checks that all required model files exist in the directory.
///
/// Returns Ok(()) if all files exist, or an error listing missing files.
pub fn check_model_files(model_dir: &Path) -> Result<()> {
    let missing: Vec<&str> = MODEL_FILES
        .iter()
        .copied()
        .filter(|file| !model_dir.join(file).exists())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TonegenError::model_not_found(format!(
            "{} (missing: {})",
            model_dir.display(),
            missing.join(", ")
        )))
    }
}

/// Builds an ONNX session for a model file, honoring the configured
/// intra-op thread count.
pub fn build_session(path: &Path, threads: Option<u32>) -> Result<Session> {
    let mut builder = Session::builder()
        .map_err(|e| TonegenError::model_load_failed(format!("failed to create session: {}", e)))?;

    if let Some(threads) = threads {
        builder = builder.with_intra_threads(threads as usize).map_err(|e| {
            TonegenError::model_load_failed(format!("failed to set thread count: {}", e))
        })?;
    }

    builder.commit_from_file(path).map_err(|e| {
        TonegenError::model_load_failed(format!("failed to load {}: {}", path.display(), e))
    })
}

/// Loads model configuration from config.json, falling back to the
/// musicgen-small defaults when absent.
fn load_model_config(model_dir: &Path) -> Result<ModelConfig> {
    let config_path = model_dir.join("config.json");
    if !config_path.exists() {
        return Ok(ModelConfig::musicgen_small());
    }

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        TonegenError::model_load_failed(format!("failed to read config.json: {}", e))
    })?;

    // The HuggingFace config nests decoder parameters one level down.
    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        TonegenError::model_load_failed(format!("failed to parse config.json: {}", e))
    })?;
    let decoder = json
        .get("decoder")
        .ok_or_else(|| TonegenError::model_load_failed("config.json missing 'decoder' section"))?;

    let defaults = ModelConfig::musicgen_small();
    let config = ModelConfig {
        vocab_size: decoder
            .get("vocab_size")
            .and_then(|v| v.as_u64())
            .unwrap_or(defaults.vocab_size as u64) as u32,
        num_hidden_layers: decoder
            .get("num_hidden_layers")
            .and_then(|v| v.as_u64())
            .unwrap_or(defaults.num_hidden_layers as u64) as u32,
        pad_token_id: decoder
            .get("pad_token_id")
            .and_then(|v| v.as_i64())
            .unwrap_or(defaults.pad_token_id),
        sample_rate: defaults.sample_rate,
        codebooks: defaults.codebooks,
    };

    if let Some(problem) = config.validate() {
        return Err(TonegenError::model_load_failed(format!(
            "invalid config.json: {}",
            problem
        )));
    }

    Ok(config)
}

/// Detects a model version string from the directory name.
fn detect_model_version(model_dir: &Path) -> String {
    let dir_name = model_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    let size = if dir_name.contains("medium") {
        "medium"
    } else {
        "small"
    };
    let precision = if dir_name.contains("fp32") {
        "fp32"
    } else {
        "fp16"
    };

    format!("musicgen-{}-{}", size, precision)
}

/// Loaded MusicGen model ensemble.
///
/// Owns the three ONNX sessions and the tokenizer; implements
/// [`AudioGenerator`] by running the full pipeline once per prompt.
pub struct MusicGenBackend {
    prompt_encoder: PromptEncoder,
    token_decoder: TokenDecoder,
    audio_decoder: AudioDecoder,
    config: ModelConfig,
    version: String,
}

impl MusicGenBackend {
    /// Loads all model components from a directory.
    ///
    /// The directory must contain the files in [`MODEL_FILES`]; `config.json`
    /// is optional and defaults to the musicgen-small parameters.
    pub fn load(model_dir: &Path, threads: Option<u32>) -> Result<Self> {
        check_model_files(model_dir)?;

        let config = load_model_config(model_dir)?;

        tracing::info!(model_dir = %model_dir.display(), "loading text encoder");
        let prompt_encoder = PromptEncoder::load(model_dir, threads)?;

        tracing::info!("loading decoder models");
        let token_decoder = TokenDecoder::load(model_dir, config.clone(), threads)?;

        tracing::info!("loading audio codec");
        let audio_decoder = AudioDecoder::load(model_dir, threads)?;

        let version = detect_model_version(model_dir);
        tracing::info!(version, "all model components loaded");

        Ok(Self {
            prompt_encoder,
            token_decoder,
            audio_decoder,
            config,
            version,
        })
    }

    /// Runs the full pipeline for one prompt.
    fn generate_clip(&mut self, prompt: &str, frame_count: usize) -> Result<Waveform> {
        let (hidden_states, attention_mask) = self.prompt_encoder.encode(prompt)?;

        let frames = self
            .token_decoder
            .generate(hidden_states, attention_mask, frame_count)?;

        let samples = self.audio_decoder.decode(&frames)?;
        if samples.is_empty() {
            return Err(TonegenError::generation_failed(
                "model produced no audio samples",
            ));
        }

        Ok(Waveform::mono(samples, self.config.sample_rate))
    }
}

impl AudioGenerator for MusicGenBackend {
    fn generate(&mut self, prompts: &[String], duration_sec: u32) -> Result<Vec<Waveform>> {
        let frame_count = duration_sec as usize * TOKENS_PER_SECOND;

        let mut clips = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            tracing::debug!(prompt = %prompt, frame_count, "generating clip");
            clips.push(self.generate_clip(prompt, frame_count)?);
        }
        Ok(clips)
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn model_version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_files_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_model_files(dir.path()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ModelNotFound);
        assert!(err.message.contains("tokenizer.json"));
        assert!(err.message.contains("encodec_decode.onnx"));
    }

    #[test]
    fn version_detection() {
        assert_eq!(
            detect_model_version(&PathBuf::from("/models/small_fp16")),
            "musicgen-small-fp16"
        );
        assert_eq!(
            detect_model_version(&PathBuf::from("/models/medium_fp32")),
            "musicgen-medium-fp32"
        );
        assert_eq!(
            detect_model_version(&PathBuf::from("/models/musicgen")),
            "musicgen-small-fp16"
        );
    }

    #[test]
    fn required_files_list() {
        assert_eq!(MODEL_FILES.len(), 5);
        assert!(MODEL_FILES.contains(&"tokenizer.json"));
        assert!(MODEL_FILES.contains(&"encodec_decode.onnx"));
    }

    #[test]
    fn absent_config_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_model_config(dir.path()).unwrap();
        assert_eq!(config.vocab_size, 2048);
        assert_eq!(config.num_hidden_layers, 24);
    }

    #[test]
    fn config_json_overrides_decoder_parameters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"decoder": {"num_hidden_layers": 48, "vocab_size": 2048, "pad_token_id": 2048}}"#,
        )
        .unwrap();

        let config = load_model_config(dir.path()).unwrap();
        assert_eq!(config.num_hidden_layers, 48);
    }

    #[test]
    fn config_json_without_decoder_section_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{"sample_rate": 32000}"#).unwrap();
        assert!(load_model_config(dir.path()).is_err());
    }
}

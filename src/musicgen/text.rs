//! Prompt encoding.
//!
//! Adapts a text prompt into the model's input format: HuggingFace
//! tokenization followed by the T5 text encoder session, yielding the hidden
//! states and attention mask the token decoder conditions on.

use std::path::Path;

use ort::value::{DynValue, Tensor};
use tokenizers::Tokenizer;

use crate::error::{Result, TonegenError};

use super::loader::build_session;

/// Tokenizer + T5 encoder for text prompts.
#[derive(Debug)]
pub struct PromptEncoder {
    tokenizer: Tokenizer,
    session: ort::session::Session,
}

impl PromptEncoder {
    /// Loads `tokenizer.json` and `text_encoder.onnx` from the model directory.
    pub fn load(model_dir: &Path, threads: Option<u32>) -> Result<Self> {
        let mut tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| TonegenError::model_load_failed(format!("failed to load tokenizer: {}", e)))?;

        tokenizer.with_padding(None).with_truncation(None).map_err(|e| {
            TonegenError::model_load_failed(format!("failed to configure tokenizer: {}", e))
        })?;

        let session = build_session(&model_dir.join("text_encoder.onnx"), threads)?;

        Ok(Self { tokenizer, session })
    }

    /// Encodes a prompt into (hidden states, attention mask) tensors.
    pub fn encode(&mut self, prompt: &str) -> Result<(DynValue, DynValue)> {
        let token_ids: Vec<i64> = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| TonegenError::generation_failed(format!("tokenization failed: {}", e)))?
            .get_ids()
            .iter()
            .map(|id| *id as i64)
            .collect();
        let token_count = token_ids.len();

        let input_ids = Tensor::from_array(([1, token_count], token_ids)).map_err(|e| {
            TonegenError::generation_failed(format!("failed to create input tensor: {}", e))
        })?;
        let attention_mask = Tensor::from_array(([1, token_count], vec![1i64; token_count]))
            .map_err(|e| {
                TonegenError::generation_failed(format!("failed to create attention mask: {}", e))
            })?;

        let mut outputs = self
            .session
            .run(ort::inputs![input_ids, attention_mask])
            .map_err(|e| {
                TonegenError::generation_failed(format!("text encoder inference failed: {}", e))
            })?;

        let hidden_states = outputs.remove("last_hidden_state").ok_or_else(|| {
            TonegenError::generation_failed("last_hidden_state not found in encoder output")
        })?;

        // The first mask was consumed by the encoder run; the decoder gets
        // its own copy.
        let decoder_mask = Tensor::from_array(([1, token_count], vec![1i64; token_count]))
            .map_err(|e| {
                TonegenError::generation_failed(format!("failed to create attention mask: {}", e))
            })?;

        Ok((hidden_states, decoder_mask.into_dyn()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn load_reports_missing_tokenizer() {
        let err = PromptEncoder::load(&PathBuf::from("/nonexistent"), None).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ModelLoadFailed);
    }
}

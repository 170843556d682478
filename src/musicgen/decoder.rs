//! Autoregressive token generation.
//!
//! Runs the split decoder: one full pass to prime the KV cache, then a
//! cached pass per step. Each step samples one token per codebook under
//! classifier-free guidance, and the delay-pattern grid turns the sampled
//! stream back into complete codebook frames.

use std::borrow::Cow;
use std::path::Path;

use half::f16;
use ort::session::{Session, SessionInputValue};
use ort::value::{DynValue, Tensor};

use crate::error::{Result, TonegenError};

use super::config::ModelConfig;
use super::delay::CodebookDelay;
use super::loader::build_session;
use super::sampling::{Logits, GUIDANCE_SCALE, TOP_K};

/// Split MusicGen decoder with KV cache.
pub struct TokenDecoder {
    first_pass: Session,
    with_past: Session,
    config: ModelConfig,
}

impl TokenDecoder {
    /// Loads `decoder_model.onnx` and `decoder_with_past_model.onnx` from the
    /// model directory.
    pub fn load(model_dir: &Path, config: ModelConfig, threads: Option<u32>) -> Result<Self> {
        let first_pass = build_session(&model_dir.join("decoder_model.onnx"), threads)?;
        let with_past = build_session(&model_dir.join("decoder_with_past_model.onnx"), threads)?;

        Ok(Self {
            first_pass,
            with_past,
            config,
        })
    }

    /// Generates `frame_count` codebook frames conditioned on the encoded prompt.
    ///
    /// Generates 3 extra steps to compensate for the delay pattern, which
    /// withholds the first N-1 diagonal frames (N = 4 codebooks).
    pub fn generate(
        &mut self,
        encoder_hidden_states: DynValue,
        encoder_attention_mask: DynValue,
        frame_count: usize,
    ) -> Result<Vec<[i64; 4]>> {
        let steps = frame_count + 3;
        let layers = self.config.num_hidden_layers as usize;
        let pad_token = self.config.pad_token_id;

        // Double the batch for classifier-free guidance: conditional
        // embeddings first, zeroed unconditional embeddings second.
        let encoder_hidden_states = double_with_zeros(&encoder_hidden_states)?;
        let encoder_attention_mask = double_with_zeros_i64(&encoder_attention_mask)?;

        // Prime the KV cache with a full decoder pass over pad tokens.
        let input_ids = Tensor::from_array(([8usize, 1], vec![pad_token; 8]))
            .map_err(|e| {
                TonegenError::generation_failed(format!("failed to create input_ids: {}", e))
            })?
            .into_dyn();

        let first_inputs: Vec<(Cow<str>, SessionInputValue)> = vec![
            (
                Cow::from("encoder_attention_mask"),
                SessionInputValue::from(encoder_attention_mask.view()),
            ),
            (
                Cow::from("encoder_hidden_states"),
                SessionInputValue::from(encoder_hidden_states.view()),
            ),
            (
                Cow::from("input_ids"),
                SessionInputValue::from(input_ids.view()),
            ),
        ];

        let mut outputs = self.first_pass.run(first_inputs).map_err(|e| {
            TonegenError::generation_failed(format!("initial decoder inference failed: {}", e))
        })?;

        let mut grid = CodebookDelay::<4>::new();

        let logits_value = outputs
            .remove("logits")
            .ok_or_else(|| missing_output("logits"))?;
        let logits = Logits::from_output(&logits_value)?;
        grid.push(logits.guided(GUIDANCE_SCALE).sample_top_k(TOP_K));

        // Pull the full KV cache out of the first pass, renamed to the
        // `past_key_values` inputs the cached decoder expects.
        let mut kv_cache: Vec<(String, DynValue)> = Vec::with_capacity(layers * 4);
        for layer in 0..layers {
            for slot in ["decoder.key", "decoder.value", "encoder.key", "encoder.value"] {
                let name = format!("present.{layer}.{slot}");
                let value = outputs.remove(&name).ok_or_else(|| missing_output(&name))?;
                kv_cache.push((format!("past_key_values.{layer}.{slot}"), value));
            }
        }

        let mut frames = Vec::with_capacity(frame_count);

        for _ in 0..steps {
            let [a, b, c, d] = grid.delayed_frame(pad_token);

            // Conditional and unconditional rows see the same tokens.
            let input_ids = Tensor::from_array(([8usize, 1], vec![a, b, c, d, a, b, c, d]))
                .map_err(|e| {
                    TonegenError::generation_failed(format!("failed to create input_ids: {}", e))
                })?;

            let mut step_inputs: Vec<(Cow<str>, SessionInputValue)> = vec![
                (
                    Cow::from("input_ids"),
                    SessionInputValue::from(input_ids.view()),
                ),
                (
                    Cow::from("encoder_attention_mask"),
                    SessionInputValue::from(encoder_attention_mask.view()),
                ),
            ];
            for (name, value) in &kv_cache {
                step_inputs.push((
                    Cow::from(name.as_str()),
                    SessionInputValue::from(value.view()),
                ));
            }

            let mut outputs = self.with_past.run(step_inputs).map_err(|e| {
                TonegenError::generation_failed(format!("cached decoder inference failed: {}", e))
            })?;

            let logits_value = outputs
                .remove("logits")
                .ok_or_else(|| missing_output("logits"))?;
            let logits = Logits::from_output(&logits_value)?;
            grid.push(logits.guided(GUIDANCE_SCALE).sample_top_k(TOP_K));

            if let Some(frame) = grid.undelayed_frame() {
                frames.push(frame);
            }

            // Only the decoder keys/values grow; encoder entries are reused.
            for layer in 0..layers {
                let key_name = format!("present.{layer}.decoder.key");
                let value_name = format!("present.{layer}.decoder.value");
                let key = outputs
                    .remove(&key_name)
                    .ok_or_else(|| missing_output(&key_name))?;
                let value = outputs
                    .remove(&value_name)
                    .ok_or_else(|| missing_output(&value_name))?;

                kv_cache[layer * 4] = (format!("past_key_values.{layer}.decoder.key"), key);
                kv_cache[layer * 4 + 1] = (format!("past_key_values.{layer}.decoder.value"), value);
            }
        }

        Ok(frames)
    }
}

fn missing_output(name: &str) -> TonegenError {
    TonegenError::generation_failed(format!("{} not found in decoder output", name))
}

/// Doubles a tensor along the batch axis, filling the new half with zeros.
/// The zeroed half is the unconditional branch for classifier-free guidance.
/// Handles both f16 and f32 tensors.
fn double_with_zeros(tensor: &DynValue) -> Result<DynValue> {
    if let Ok(result) = double_with_zeros_typed::<f16>(tensor) {
        return Ok(result);
    }
    double_with_zeros_typed::<f32>(tensor)
}

fn double_with_zeros_typed<T>(tensor: &DynValue) -> Result<DynValue>
where
    T: ort::value::PrimitiveTensorElementType + Clone + Default + std::fmt::Debug + 'static,
{
    let (shape, data) = tensor
        .try_extract_tensor::<T>()
        .map_err(|e| TonegenError::generation_failed(format!("failed to extract tensor: {}", e)))?;

    let mut doubled_shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
    doubled_shape[0] *= 2;

    let zeros = vec![T::default(); data.len()];
    let doubled: Vec<T> = data.to_vec().into_iter().chain(zeros).collect();

    let result = Tensor::from_array((doubled_shape, doubled)).map_err(|e| {
        TonegenError::generation_failed(format!("failed to create doubled tensor: {}", e))
    })?;

    Ok(result.into_dyn())
}

fn double_with_zeros_i64(tensor: &DynValue) -> Result<DynValue> {
    let (shape, data) = tensor.try_extract_tensor::<i64>().map_err(|e| {
        TonegenError::generation_failed(format!("failed to extract i64 tensor: {}", e))
    })?;

    let mut doubled_shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
    doubled_shape[0] *= 2;

    let zeros = vec![0i64; data.len()];
    let doubled: Vec<i64> = data.to_vec().into_iter().chain(zeros).collect();

    let result = Tensor::from_array((doubled_shape, doubled)).map_err(|e| {
        TonegenError::generation_failed(format!("failed to create doubled i64 tensor: {}", e))
    })?;

    Ok(result.into_dyn())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubling_i64_appends_zero_half() {
        let tensor = Tensor::from_array(([1usize, 3], vec![1i64, 1, 1]))
            .unwrap()
            .into_dyn();
        let doubled = double_with_zeros_i64(&tensor).unwrap();
        let (shape, data) = doubled.try_extract_tensor::<i64>().unwrap();
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        assert_eq!(dims, vec![2, 3]);
        assert_eq!(data, &[1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn doubling_f32_appends_zero_half() {
        let tensor = Tensor::from_array(([1usize, 2], vec![0.5f32, -0.5]))
            .unwrap()
            .into_dyn();
        let doubled = double_with_zeros(&tensor).unwrap();
        let (shape, data) = doubled.try_extract_tensor::<f32>().unwrap();
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        assert_eq!(dims, vec![2, 2]);
        assert_eq!(data, &[0.5, -0.5, 0.0, 0.0]);
    }
}

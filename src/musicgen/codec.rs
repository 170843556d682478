//! EnCodec audio decode.
//!
//! Turns generated codebook frames back into floating-point audio samples
//! via the EnCodec decoder session.

use std::path::Path;

use half::f16;
use ort::session::Session;
use ort::value::{DynValue, Tensor};

use crate::error::{Result, TonegenError};

use super::loader::build_session;

/// EnCodec decoder session wrapper.
pub struct AudioDecoder {
    session: Session,
}

impl AudioDecoder {
    /// Loads `encodec_decode.onnx` from the model directory.
    pub fn load(model_dir: &Path, threads: Option<u32>) -> Result<Self> {
        let session = build_session(&model_dir.join("encodec_decode.onnx"), threads)?;
        Ok(Self { session })
    }

    /// Decodes codebook frames into f32 audio samples.
    ///
    /// Accepts both f32 and f16 model outputs. An empty frame list decodes
    /// to an empty sample buffer without touching the session.
    pub fn decode(&mut self, frames: &[[i64; 4]]) -> Result<Vec<f32>> {
        if frames.is_empty() {
            return Ok(Vec::new());
        }

        let steps = frames.len();

        // EnCodec wants [1, 1, codebooks, steps]; the frames arrive
        // step-major, so transpose into codebook-major order.
        let mut codes = vec![0i64; steps * 4];
        for (step, frame) in frames.iter().enumerate() {
            for (codebook, token) in frame.iter().enumerate() {
                codes[codebook * steps + step] = *token;
            }
        }

        let input = Tensor::from_array(([1usize, 1, 4, steps], codes)).map_err(|e| {
            TonegenError::generation_failed(format!("failed to create code tensor: {}", e))
        })?;

        let mut outputs = self.session.run(ort::inputs![input]).map_err(|e| {
            TonegenError::generation_failed(format!("audio codec inference failed: {}", e))
        })?;

        let audio: DynValue = outputs.remove("audio_values").ok_or_else(|| {
            TonegenError::generation_failed("audio_values not found in codec output")
        })?;

        if let Ok((_, data)) = audio.try_extract_tensor::<f32>() {
            return Ok(data.to_vec());
        }
        if let Ok((_, data)) = audio.try_extract_tensor::<f16>() {
            return Ok(data.iter().map(|v| f32::from(*v)).collect());
        }

        Err(TonegenError::generation_failed(
            "audio values must be either f16 or f32",
        ))
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn frame_transpose_is_codebook_major() {
        let frames = [[1i64, 2, 3, 4], [5, 6, 7, 8]];
        let steps = frames.len();

        let mut codes = vec![0i64; steps * 4];
        for (step, frame) in frames.iter().enumerate() {
            for (codebook, token) in frame.iter().enumerate() {
                codes[codebook * steps + step] = *token;
            }
        }

        assert_eq!(codes, vec![1, 5, 2, 6, 3, 7, 4, 8]);
    }
}

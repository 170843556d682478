//! Logits post-processing for the token decoder.
//!
//! Applies classifier-free guidance over the doubled conditional /
//! unconditional batch, then samples the next token per codebook with
//! weighted top-k.

use std::fmt::{Debug, Formatter};

use half::f16;
use ndarray::{s, Array, Array2, Axis, Ix3, IxDyn};
use ort::util::ArrayExt;
use ort::value::DynValue;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::thread_rng;

use crate::error::{Result, TonegenError};

/// Guidance scale for classifier-free guidance.
pub const GUIDANCE_SCALE: usize = 3;

/// Top-k cutoff for sampling.
pub const TOP_K: usize = 250;

/// One decoder step's logits, shape `[batch, vocab]`.
pub struct Logits(Array2<f32>);

impl Debug for Logits {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Logits({:?})", self.0.dim())
    }
}

impl Logits {
    /// Extracts logits from a decoder output tensor.
    ///
    /// The model emits `[batch, decoder_sequence_length, vocab]` in f32 or
    /// f16; the sequence length is always 1 in autoregressive decoding, so
    /// that axis is squeezed away.
    pub fn from_output(value: &DynValue) -> Result<Self> {
        let (shape, data): (Vec<usize>, Vec<f32>) =
            if let Ok((shape, data)) = value.try_extract_tensor::<f32>() {
                (shape.iter().map(|&d| d as usize).collect(), data.to_vec())
            } else if let Ok((shape, data)) = value.try_extract_tensor::<f16>() {
                (
                    shape.iter().map(|&d| d as usize).collect(),
                    data.iter().map(|v| f32::from(*v)).collect(),
                )
            } else {
                return Err(TonegenError::generation_failed("logits must be f32 or f16"));
            };

        let array = Array::from_shape_vec(IxDyn(&shape), data)
            .map_err(|e| TonegenError::generation_failed(format!("bad logits shape: {}", e)))?
            .into_dimensionality::<Ix3>()
            .map_err(|e| TonegenError::generation_failed(format!("expected 3D logits: {}", e)))?;

        Ok(Self(array.remove_axis(Axis(1))))
    }

    /// Applies classifier-free guidance.
    ///
    /// The batch carries conditional logits in the first half and
    /// unconditional logits in the second:
    /// `guided = uncond + (cond - uncond) * scale`.
    ///
    /// # Panics
    ///
    /// Panics if the batch dimension is odd.
    pub fn guided(self, scale: usize) -> Self {
        assert!(
            self.0.dim().0 % 2 == 0,
            "classifier-free guidance needs an even batch"
        );

        let half = self.0.dim().0 / 2;
        let cond = self.0.slice(s![0..half, ..]);
        let uncond = self.0.slice(s![half.., ..]);

        Self((cond.into_owned() - uncond) * scale as f32 + uncond)
    }

    /// Samples one token per batch row with weighted top-k.
    pub fn sample_top_k(&self, k: usize) -> Vec<i64> {
        let probabilities = self.0.softmax(Axis(1));
        let mut sampled = Vec::with_capacity(probabilities.dim().0);

        for row in probabilities.axis_iter(Axis(0)) {
            let k = k.min(row.len());

            let mut candidates: Vec<(i64, f32)> = row
                .iter()
                .enumerate()
                .map(|(token, p)| (token as i64, *p))
                .collect();

            // Most probable tokens first, then keep the top k.
            candidates.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .expect("softmax probabilities are comparable")
            });
            candidates.truncate(k);

            let distribution = WeightedIndex::new(candidates.iter().map(|(_, p)| *p))
                .expect("top-k probabilities form a valid distribution");
            let (token, _) = candidates[distribution.sample(&mut thread_rng())];
            sampled.push(token);
        }

        sampled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    #[test]
    fn guidance_halves_the_batch() {
        let array = Array::from_shape_vec((2, 3), vec![10., -1., 3., -1., 1., 11.]).unwrap();
        let guided = Logits(array).guided(3);
        assert_eq!(guided.0.shape(), &[1, 3]);
    }

    #[test]
    fn guidance_formula() {
        // cond = [2], uncond = [1]: guided = 1 + (2 - 1) * 3 = 4
        let array = Array::from_shape_vec((2, 1), vec![2.0, 1.0]).unwrap();
        let guided = Logits(array).guided(3);
        assert_eq!(guided.0[[0, 0]], 4.0);
    }

    #[test]
    fn sampled_tokens_are_in_vocabulary() {
        let array = Array::from_shape_vec((2, 3), vec![0.1, 0.2, 0.7, 0.3, 0.4, 0.3]).unwrap();
        let tokens = Logits(array).sample_top_k(2);
        assert_eq!(tokens.len(), 2);
        for token in tokens {
            assert!((0..3).contains(&token));
        }
    }

    #[test]
    fn top_one_is_argmax() {
        let array = Array::from_shape_vec((1, 4), vec![0.0, 9.0, 1.0, 2.0]).unwrap();
        let tokens = Logits(array).sample_top_k(1);
        assert_eq!(tokens, vec![1]);
    }
}

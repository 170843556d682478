//! MusicGen model architecture parameters.
//!
//! The subset of the model's config.json the inference pipeline needs for
//! tensor shapes and token handling.

use serde::{Deserialize, Serialize};

/// Architecture parameters for the MusicGen model ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Token vocabulary size (2048 for MusicGen).
    pub vocab_size: u32,

    /// Number of decoder transformer layers (24 for musicgen-small).
    pub num_hidden_layers: u32,

    /// Padding token ID for the decoder; MusicGen uses the vocabulary size.
    pub pad_token_id: i64,

    /// Output sample rate in Hz (always 32000 for MusicGen).
    pub sample_rate: u32,

    /// Number of EnCodec codebooks (always 4 for MusicGen).
    pub codebooks: u32,
}

impl ModelConfig {
    /// Parameters for the musicgen-small export.
    pub fn musicgen_small() -> Self {
        Self {
            vocab_size: 2048,
            num_hidden_layers: 24,
            pad_token_id: 2048,
            sample_rate: 32000,
            codebooks: 4,
        }
    }

    /// Validates the configuration for consistency.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if self.vocab_size == 0 {
            return Some("vocab_size must be > 0".to_string());
        }

        if self.num_hidden_layers == 0 {
            return Some("num_hidden_layers must be > 0".to_string());
        }

        if self.sample_rate != 32000 {
            return Some(format!("sample_rate must be 32000, got {}", self.sample_rate));
        }

        if self.codebooks != 4 {
            return Some(format!("codebooks must be 4, got {}", self.codebooks));
        }

        None
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::musicgen_small()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn musicgen_small_parameters() {
        let config = ModelConfig::musicgen_small();
        assert_eq!(config.vocab_size, 2048);
        assert_eq!(config.num_hidden_layers, 24);
        assert_eq!(config.pad_token_id, 2048);
        assert_eq!(config.sample_rate, 32000);
        assert_eq!(config.codebooks, 4);
        assert!(config.validate().is_none());
    }

    #[test]
    fn wrong_sample_rate_fails_validation() {
        let mut config = ModelConfig::musicgen_small();
        config.sample_rate = 44100;
        assert!(config.validate().is_some());
    }

    #[test]
    fn wrong_codebook_count_fails_validation() {
        let mut config = ModelConfig::musicgen_small();
        config.codebooks = 8;
        assert!(config.validate().is_some());
    }
}

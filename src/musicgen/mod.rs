//! MusicGen ONNX backend.
//!
//! The concrete generation adapter: tokenizer + T5 text encoder,
//! autoregressive token decoder with KV cache and 4-codebook delay pattern,
//! and EnCodec audio decode, all running on ONNX Runtime. Model files are
//! downloaded from HuggingFace on first use.

pub mod codec;
pub mod config;
pub mod decoder;
pub mod delay;
pub mod download;
pub mod loader;
pub mod sampling;
pub mod text;

// Re-export commonly used items
pub use config::ModelConfig;
pub use download::ensure_model_files;
pub use loader::{check_model_files, MusicGenBackend, MODEL_FILES};

/// Decoder token frames generated per second of audio.
/// MusicGen produces approximately 50 frames per second at 32 kHz.
pub const TOKENS_PER_SECOND: usize = 50;

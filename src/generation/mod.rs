//! Generation adapter seam.
//!
//! Defines the [`Waveform`] data type produced by generation backends and the
//! [`AudioGenerator`] trait that makes the upstream model injectable: any
//! backend that can turn a batch of prompts into waveforms can sit behind the
//! server or the CLI.

pub mod service;

pub use service::GenerationService;

use crate::error::Result;

/// A raw floating-point waveform produced by a generation backend.
///
/// Samples are channel-interleaved frames, nominally within [-1.0, 1.0]
/// (the encoder clamps; the backend is not trusted to bound its output).
/// Read-only once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Interleaved f32 samples.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u16,
}

impl Waveform {
    /// Creates a single-channel waveform.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Returns the number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Returns the duration of the waveform in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f32 / self.sample_rate as f32
        }
    }
}

/// A text-to-audio generation backend.
///
/// The contract: one waveform per prompt, in prompt order. The backend owns
/// tokenization, inference, and decoding; callers only see prompts in and
/// waveforms out.
pub trait AudioGenerator: Send {
    /// Generates one waveform per prompt.
    ///
    /// `duration_sec` is the requested clip length; backends may produce
    /// slightly more or less audio depending on their token granularity.
    fn generate(&mut self, prompts: &[String], duration_sec: u32) -> Result<Vec<Waveform>>;

    /// Returns the sample rate of generated audio in Hz.
    fn sample_rate(&self) -> u32;

    /// Returns the model identifier, for logging and diagnostics.
    fn model_version(&self) -> &str;
}

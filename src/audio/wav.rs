//! Waveform-to-WAV encoding.
//!
//! Converts raw floating-point model output into a playable 16-bit PCM WAV
//! byte stream using the hound crate. This is the one reusable pipeline in
//! the system: clamp, quantize, pack, wrap in a container header.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::{Result, TonegenError};
use crate::generation::Waveform;

/// Positive full-scale value for 16-bit quantization.
///
/// Quantization is `round(s * 32767)` after clamping, so `-1.0` maps to
/// `-32767`, one unit above the i16 minimum. The asymmetric positive-full-
/// scale convention matches the upstream model tooling and is locked by the
/// boundary tests below.
pub const FULL_SCALE: f32 = 32767.0;

/// Output bit depth.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Quantizes one floating-point sample to 16-bit signed PCM.
///
/// The clamp is a correctness step, not an optimization: model output is not
/// guaranteed to be bounded, and an unclamped value would wrap in i16 and
/// produce audible corruption.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * FULL_SCALE).round() as i16
}

/// Validates encoder input constraints, before any allocation.
fn check_input(samples: &[f32], sample_rate: u32, channels: u16) -> Result<()> {
    if samples.is_empty() {
        return Err(TonegenError::invalid_waveform("empty sample buffer"));
    }
    if sample_rate == 0 {
        return Err(TonegenError::invalid_waveform("sample rate must be > 0"));
    }
    if channels == 0 {
        return Err(TonegenError::invalid_waveform("channel count must be > 0"));
    }
    if samples.len() % channels as usize != 0 {
        return Err(TonegenError::invalid_waveform(format!(
            "{} samples is not a whole number of {}-channel frames",
            samples.len(),
            channels
        )));
    }
    Ok(())
}

fn pcm_spec(sample_rate: u32, channels: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Encodes interleaved floating-point samples into a WAV byte stream.
///
/// The returned bytes are a complete, self-describing container: linear PCM
/// format tag, the given channel count and sample rate, 16 bits per sample,
/// and a data chunk holding the little-endian quantized samples. Parseable
/// by any standard WAV reader with no further state.
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    check_input(samples, sample_rate, channels)?;

    let mut buffer = Vec::new();
    let mut writer = WavWriter::new(Cursor::new(&mut buffer), pcm_spec(sample_rate, channels))
        .map_err(|e| TonegenError::encoding_failed(format!("failed to create WAV writer: {}", e)))?;

    for sample in samples {
        writer
            .write_sample(quantize(*sample))
            .map_err(|e| TonegenError::encoding_failed(format!("failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| TonegenError::encoding_failed(format!("failed to finalize WAV: {}", e)))?;

    Ok(buffer)
}

/// Encodes a waveform into a WAV byte stream.
pub fn encode_waveform(waveform: &Waveform) -> Result<Vec<u8>> {
    encode_wav(&waveform.samples, waveform.sample_rate, waveform.channels)
}

/// Encodes a batch of waveforms, one discrete container per clip.
///
/// A batch never collapses into a single output: callers get exactly
/// `clips.len()` byte streams, in input order.
pub fn encode_clips(clips: &[Waveform]) -> Result<Vec<Vec<u8>>> {
    clips.iter().map(encode_waveform).collect()
}

/// Writes interleaved floating-point samples to a WAV file.
///
/// Same quantization contract as [`encode_wav`], streaming to disk instead
/// of a memory buffer. Used by the offline output path.
pub fn write_wav(samples: &[f32], path: &Path, sample_rate: u32, channels: u16) -> Result<()> {
    check_input(samples, sample_rate, channels)?;

    let mut writer = WavWriter::create(path, pcm_spec(sample_rate, channels))
        .map_err(|e| TonegenError::encoding_failed(format!("failed to create WAV file: {}", e)))?;

    for sample in samples {
        writer
            .write_sample(quantize(*sample))
            .map_err(|e| TonegenError::encoding_failed(format!("failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| TonegenError::encoding_failed(format!("failed to finalize WAV: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::tempdir;

    fn decode(bytes: &[u8]) -> (WavSpec, Vec<i16>) {
        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn header_reports_input_parameters() {
        for (rate, channels) in [(16000u32, 1u16), (32000, 1), (44100, 2), (8000, 4)] {
            let samples = vec![0.1f32; channels as usize * 8];
            let bytes = encode_wav(&samples, rate, channels).unwrap();
            let (spec, decoded) = decode(&bytes);
            assert_eq!(spec.sample_rate, rate);
            assert_eq!(spec.channels, channels);
            assert_eq!(spec.bits_per_sample, 16);
            assert_eq!(spec.sample_format, SampleFormat::Int);
            assert_eq!(decoded.len(), samples.len());
        }
    }

    #[test]
    fn quantize_boundaries() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 32767);
        // Asymmetric convention: -1.0 maps to -32767, not -32768.
        assert_eq!(quantize(-1.0), -32767);
    }

    #[test]
    fn out_of_range_samples_quantize_like_their_clamped_values() {
        for (raw, clamped) in [
            (1.5f32, 1.0f32),
            (-2.0, -1.0),
            (100.0, 1.0),
            (-1.0001, -1.0),
            (f32::INFINITY, 1.0),
            (f32::NEG_INFINITY, -1.0),
        ] {
            assert_eq!(quantize(raw), quantize(clamped), "raw sample {}", raw);
        }
    }

    #[test]
    fn round_trip_within_one_quantization_step() {
        let input = vec![0.0f32, 0.123, -0.817, 0.999, -0.5, 1.7, -3.0];
        let bytes = encode_wav(&input, 16000, 1).unwrap();
        let (_, decoded) = decode(&bytes);

        for (raw, q) in input.iter().zip(decoded) {
            let clamped = raw.clamp(-1.0, 1.0);
            let restored = q as f32 / FULL_SCALE;
            assert!(
                (restored - clamped).abs() <= 1.0 / FULL_SCALE,
                "sample {} decoded to {}",
                raw,
                restored
            );
        }
    }

    #[test]
    fn known_waveform_end_to_end() {
        let input = [0.0f32, 0.5, -0.5, 1.0, -1.0];
        let bytes = encode_wav(&input, 16000, 1).unwrap();

        let (spec, decoded) = decode(&bytes);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(decoded, vec![0, 16384, -16384, 32767, -32767]);

        // 5 samples at 2 bytes each in the data chunk, little-endian.
        let expected_data: Vec<u8> = [0i16, 16384, -16384, 32767, -32767]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        assert_eq!(&bytes[bytes.len() - 10..], expected_data.as_slice());
    }

    #[test]
    fn empty_waveform_is_rejected() {
        let err = encode_wav(&[], 16000, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidWaveform);
    }

    #[test]
    fn zero_rate_and_zero_channels_are_rejected() {
        let samples = [0.0f32, 0.1];
        assert_eq!(
            encode_wav(&samples, 0, 1).unwrap_err().code,
            ErrorCode::InvalidWaveform
        );
        assert_eq!(
            encode_wav(&samples, 16000, 0).unwrap_err().code,
            ErrorCode::InvalidWaveform
        );
    }

    #[test]
    fn ragged_frames_are_rejected() {
        // 3 samples cannot form whole stereo frames.
        let err = encode_wav(&[0.0, 0.1, 0.2], 16000, 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidWaveform);
    }

    #[test]
    fn batch_returns_one_container_per_clip() {
        let first = Waveform::mono(vec![0.25f32; 4], 32000);
        let second = Waveform::mono(vec![-0.75f32; 8], 32000);

        let containers = encode_clips(&[first.clone(), second]).unwrap();
        assert_eq!(containers.len(), 2);

        // The first clip survives intact: no last-clip-wins overwrite.
        let (_, decoded) = decode(&containers[0]);
        assert_eq!(decoded, vec![quantize(0.25); 4]);
        let (_, decoded) = decode(&containers[1]);
        assert_eq!(decoded.len(), 8);
    }

    #[test]
    fn batch_with_one_bad_clip_fails_whole() {
        let good = Waveform::mono(vec![0.1f32; 4], 32000);
        let bad = Waveform::mono(vec![], 32000);
        assert!(encode_clips(&[good, bad]).is_err());
    }

    #[test]
    fn write_wav_creates_parseable_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.wav");

        let samples = vec![0.0f32, 0.5, -0.5, 0.0];
        write_wav(&samples, &path, 32000, 1).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 32000);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, vec![0, 16384, -16384, 0]);
    }

    #[test]
    fn wav_bytes_start_with_riff() {
        let bytes = encode_wav(&[0.0, 0.1], 16000, 1).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }
}

//! Loudness normalization for the offline output path.
//!
//! Scales a clip so its RMS level hits a target dBFS, with a peak cap so the
//! gain never pushes a sample past full scale.

/// Default loudness target in dBFS, matching the upstream export tooling.
pub const DEFAULT_TARGET_DB: f32 = -14.0;

/// Returns the RMS level of the buffer in dBFS.
///
/// Returns None for an empty or fully silent buffer, which has no defined
/// level and must not be scaled.
pub fn rms_db(samples: &[f32]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }

    let mean_square = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    if mean_square <= 0.0 {
        None
    } else {
        // 20 * log10(rms) == 10 * log10(mean_square)
        Some(10.0 * mean_square.log10())
    }
}

/// Normalizes the buffer toward `target_db` RMS, in place.
///
/// The gain is capped so the loudest sample lands at full scale rather than
/// clipping: a quiet clip with a sharp transient gets less than the
/// requested gain instead of distortion.
pub fn normalize_loudness(samples: &mut [f32], target_db: f32) {
    let Some(current_db) = rms_db(samples) else {
        return;
    };

    let mut gain = 10.0_f32.powf((target_db - current_db) / 20.0);

    let peak = samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
    if peak * gain > 1.0 {
        gain = 1.0 / peak;
    }

    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}

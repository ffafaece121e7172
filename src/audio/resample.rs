//! Resampling and channel mixing.
//!
//! Whisper wants **16 kHz mono `f32`**.  Microphones usually deliver 44.1 or
//! 48 kHz, often stereo:
//!
//! 1. [`stereo_to_mono`] downmixes any number of interleaved channels.
//! 2. [`resample_to_16k`] does band-limited sinc resampling with `rubato`,
//!    falling back to linear interpolation for buffers too short for the
//!    sinc filter.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Sample rate expected by the STT engine.
pub const TARGET_RATE: u32 = 16_000;

/// Inputs shorter than this skip the sinc filter.
const MIN_SINC_INPUT: usize = 1_024;

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging channels.
///
/// ```rust
/// use civic_voice::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, -0.2]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample_to_16k
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` Hz to [`TARGET_RATE`].
///
/// ```rust
/// use civic_voice::audio::resample_to_16k;
///
/// let mono_16k = vec![0.1_f32; 160];
/// assert_eq!(resample_to_16k(&mono_16k, 16_000).len(), 160);
///
/// let short_48k = vec![0.5_f32; 480];
/// assert_eq!(resample_to_16k(&short_48k, 48_000).len(), 160);
/// ```
pub fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == TARGET_RATE || source_rate == 0 {
        return samples.to_vec();
    }
    if samples.is_empty() {
        return Vec::new();
    }
    if samples.len() >= MIN_SINC_INPUT {
        match resample_sinc(samples, source_rate) {
            Ok(out) => return out,
            Err(e) => log::warn!("sinc resampling failed ({e}); using linear interpolation"),
        }
    }
    resample_linear(samples, source_rate)
}

fn resample_sinc(samples: &[f32], source_rate: u32) -> Result<Vec<f32>, String> {
    let ratio = TARGET_RATE as f64 / source_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, samples.len(), 1)
        .map_err(|e| e.to_string())?;
    let mut out = resampler
        .process(&[samples], None)
        .map_err(|e| e.to_string())?;
    Ok(out.pop().unwrap_or_default())
}

fn resample_linear(samples: &[f32], source_rate: u32) -> Vec<f32> {
    let ratio = TARGET_RATE as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = match (samples.get(idx), samples.get(idx + 1)) {
            (Some(a), Some(b)) => a * (1.0 - frac) + b * frac,
            (Some(a), None) => *a,
            _ => 0.0,
        };
        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

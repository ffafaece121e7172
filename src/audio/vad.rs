//! Energy-based Voice Activity Detection (VAD).
//!
//! Used twice while listening: per incoming chunk to notice when the user
//! starts and stops talking, and on the finished clip to trim leading and
//! trailing silence before Whisper sees it (silence makes Whisper
//! hallucinate).
//!
//! Audio is split into 30 ms frames.  A frame is *voice* when its RMS
//! amplitude exceeds the threshold.

/// Energy-based speech detector and silence trimmer.
///
/// ```rust
/// use civic_voice::audio::VadDetector;
///
/// let vad = VadDetector::new(0.01);
/// let mut audio = vec![0.0_f32; 480];
/// audio.extend(vec![0.5_f32; 480]);
/// audio.extend(vec![0.0_f32; 480]);
///
/// assert!(vad.contains_voice(&audio));
/// assert_eq!(vad.trim_silence(&audio).len(), 480);
/// ```
#[derive(Debug, Clone)]
pub struct VadDetector {
    rms_threshold: f32,
    /// Frame size in samples.  Default: 480 samples = 30 ms at 16 kHz.
    frame_size: usize,
}

impl VadDetector {
    /// Detector for 16 kHz audio.
    pub fn new(rms_threshold: f32) -> Self {
        Self {
            rms_threshold,
            frame_size: 480,
        }
    }

    /// Detector with 30 ms frames at `sample_rate`.
    pub fn for_rate(rms_threshold: f32, sample_rate: u32) -> Self {
        Self::with_frame_size(rms_threshold, (sample_rate as usize * 30 / 1000).max(1))
    }

    /// # Panics
    ///
    /// Panics if `frame_size == 0`.
    pub fn with_frame_size(rms_threshold: f32, frame_size: usize) -> Self {
        assert!(frame_size > 0, "frame_size must be > 0");
        Self {
            rms_threshold,
            frame_size,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.rms_threshold
    }

    fn is_voice_frame(&self, chunk: &[f32]) -> bool {
        if chunk.is_empty() {
            return false;
        }
        let mean_sq: f32 = chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32;
        mean_sq.sqrt() > self.rms_threshold
    }

    /// `true` when any frame of `audio` is voice.
    pub fn contains_voice(&self, audio: &[f32]) -> bool {
        audio
            .chunks(self.frame_size)
            .any(|frame| self.is_voice_frame(frame))
    }

    /// Trim leading and trailing silence.  Returns an empty slice when the
    /// whole signal is silent.
    pub fn trim_silence<'a>(&self, audio: &'a [f32]) -> &'a [f32] {
        let frames: Vec<&[f32]> = audio.chunks(self.frame_size).collect();

        let Some(first) = frames.iter().position(|f| self.is_voice_frame(f)) else {
            return &audio[0..0];
        };
        let last = frames
            .iter()
            .rposition(|f| self.is_voice_frame(f))
            .unwrap_or(first);

        let start = first * self.frame_size;
        let end = ((last + 1) * self.frame_size).min(audio.len());
        &audio[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_signal(silent_pre: usize, voice: usize, silent_post: usize) -> Vec<f32> {
        let mut v = vec![0.0_f32; silent_pre];
        v.extend(vec![0.5_f32; voice]);
        v.extend(vec![0.0_f32; silent_post]);
        v
    }

    #[test]
    fn trims_leading_and_trailing_silence() {
        let audio = make_signal(480, 480, 480);
        assert_eq!(VadDetector::new(0.01).trim_silence(&audio).len(), 480);
    }

    #[test]
    fn all_silence_returns_empty() {
        let vad = VadDetector::new(0.01);
        let audio = vec![0.0_f32; 1440];
        assert!(vad.trim_silence(&audio).is_empty());
        assert!(!vad.contains_voice(&audio));
    }

    #[test]
    fn empty_input_returns_empty() {
        let vad = VadDetector::new(0.01);
        assert!(vad.trim_silence(&[]).is_empty());
        assert!(!vad.contains_voice(&[]));
    }

    #[test]
    fn frame_size_follows_sample_rate() {
        // 30 ms at 48 kHz = 1440 samples.
        let vad = VadDetector::for_rate(0.01, 48_000);
        let audio = make_signal(1440, 1440, 1440);
        assert_eq!(vad.trim_silence(&audio).len(), 1440);
    }

    #[test]
    #[should_panic(expected = "frame_size must be > 0")]
    fn zero_frame_size_panics() {
        VadDetector::with_frame_size(0.01, 0);
    }
}

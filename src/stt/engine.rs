//! Core STT engine trait and implementations.
//!
//! [`SttEngine`] is object-safe and `Send + Sync` so one loaded model can be
//! shared behind an `Arc<dyn SttEngine>` by every recognizer the platform
//! hands out.  The language is chosen per call, since a capture session can
//! be rebuilt for another language without reloading the model.
//!
//! [`MockSttEngine`] (available under `#[cfg(test)]`) returns a
//! pre-configured response and records the languages it was asked for.

use std::path::Path;

use thiserror::Error;
use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters};

use crate::error::VoiceErrorKind;
use crate::stt::transcribe::{SamplingStrategy, TranscribeParams};

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum SttError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// `whisper_rs` failed to initialise a `WhisperContext` or `WhisperState`.
    #[error("Whisper context initialisation failed: {0}")]
    ContextInit(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Audio too short: minimum 0.5 s (8 000 samples at 16 kHz)")]
    AudioTooShort,

    #[error("Audio too long: maximum 60 s (960 000 samples at 16 kHz)")]
    AudioTooLong,
}

impl SttError {
    /// How the failure is reported to the capture session.
    pub fn kind(&self) -> VoiceErrorKind {
        match self {
            Self::ModelNotFound(_) | Self::ContextInit(_) => VoiceErrorKind::Unsupported,
            Self::AudioTooShort => VoiceErrorKind::NoSpeechDetected,
            Self::Transcription(_) | Self::AudioTooLong => VoiceErrorKind::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// SttEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech-to-text engines.
///
/// # Contract
///
/// - `audio` must be **16 kHz, mono, f32** PCM samples.
/// - `language` is an ISO-639-1 code (`"hi"`, `"en"`) or `"auto"`.
/// - Returns `Err(SttError::AudioTooShort)` when `audio.len() < MIN_AUDIO_SAMPLES`.
/// - Returns `Err(SttError::AudioTooLong)` when `audio.len() > MAX_AUDIO_SAMPLES`.
pub trait SttEngine: Send + Sync {
    fn transcribe(&self, audio: &[f32], language: &str) -> Result<String, SttError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SttEngine>) {}
};

/// 0.5 s at 16 kHz.
pub const MIN_AUDIO_SAMPLES: usize = 8_000;
/// 60 s at 16 kHz.
pub const MAX_AUDIO_SAMPLES: usize = 960_000;

/// Fit `audio` into the engine's accepted length range: short clips are
/// padded with trailing silence, long ones keep their most recent minute.
pub fn fit_audio(audio: &[f32]) -> Vec<f32> {
    if audio.len() > MAX_AUDIO_SAMPLES {
        return audio[audio.len() - MAX_AUDIO_SAMPLES..].to_vec();
    }
    let mut out = audio.to_vec();
    if out.len() < MIN_AUDIO_SAMPLES {
        out.resize(MIN_AUDIO_SAMPLES, 0.0);
    }
    out
}

// ---------------------------------------------------------------------------
// WhisperEngine
// ---------------------------------------------------------------------------

/// Production STT engine wrapping a `whisper_rs::WhisperContext`.
///
/// A fresh `WhisperState` is created per call, so the engine is shared
/// across recognizer threads without locking.
pub struct WhisperEngine {
    ctx: WhisperContext,
    params: TranscribeParams,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs; model
// weights are read-only after loading.
unsafe impl Send for WhisperEngine {}
unsafe impl Sync for WhisperEngine {}

impl WhisperEngine {
    /// Load a GGML model from `model_path`.
    ///
    /// # Errors
    ///
    /// - [`SttError::ModelNotFound`] when `model_path` does not exist.
    /// - [`SttError::ContextInit`] when whisper-rs cannot load the file.
    pub fn load(model_path: impl AsRef<Path>, params: TranscribeParams) -> Result<Self, SttError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(SttError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            SttError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        log::info!("loaded whisper model from {}", path.display());
        Ok(Self { ctx, params })
    }

    fn full_params<'a>(&self, language: &'a str) -> FullParams<'a, 'a> {
        use whisper_rs::SamplingStrategy as WS;
        let ws = match self.params.strategy {
            SamplingStrategy::Greedy { best_of } => WS::Greedy { best_of },
            SamplingStrategy::BeamSearch { beam_size, patience } => {
                WS::BeamSearch { beam_size, patience }
            }
        };

        let mut fp = FullParams::new(ws);
        fp.set_language(if language == "auto" { None } else { Some(language) });
        fp.set_n_threads(self.params.n_threads);
        fp.set_no_context(true);
        fp.set_print_special(false);
        fp.set_print_timestamps(false);
        if self.params.suppress_progress {
            fp.set_print_progress(false);
            fp.set_print_realtime(false);
        }
        fp
    }
}

impl SttEngine for WhisperEngine {
    fn transcribe(&self, audio: &[f32], language: &str) -> Result<String, SttError> {
        if audio.len() < MIN_AUDIO_SAMPLES {
            return Err(SttError::AudioTooShort);
        }
        if audio.len() > MAX_AUDIO_SAMPLES {
            return Err(SttError::AudioTooLong);
        }

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        let started = std::time::Instant::now();
        state
            .full(self.full_params(language), audio)
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))?;
            text.push_str(&segment);
        }

        log::debug!(
            "transcribed {:.1}s of audio ({language}) in {} ms",
            audio.len() as f32 / 16_000.0,
            started.elapsed().as_millis()
        );
        Ok(text.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// MockSttEngine  (test-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
pub struct MockSttEngine {
    response: Result<String, SttError>,
    languages: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockSttEngine {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            languages: Default::default(),
        }
    }

    pub fn err(error: SttError) -> Self {
        Self {
            response: Err(error),
            languages: Default::default(),
        }
    }

    /// Languages passed to every `transcribe` call so far.
    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SttEngine for MockSttEngine {
    fn transcribe(&self, audio: &[f32], language: &str) -> Result<String, SttError> {
        if audio.len() < MIN_AUDIO_SAMPLES {
            return Err(SttError::AudioTooShort);
        }
        if audio.len() > MAX_AUDIO_SAMPLES {
            return Err(SttError::AudioTooLong);
        }
        self.languages.lock().unwrap().push(language.to_string());
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_text_and_records_language() {
        let engine = MockSttEngine::ok("नमस्ते");
        let audio = vec![0.0f32; MIN_AUDIO_SAMPLES];
        assert_eq!(engine.transcribe(&audio, "hi").unwrap(), "नमस्ते");
        assert_eq!(engine.languages(), vec!["hi".to_string()]);
    }

    #[test]
    fn mock_enforces_length_contract() {
        let engine = MockSttEngine::ok("text");
        let short = vec![0.0f32; MIN_AUDIO_SAMPLES - 1];
        assert!(matches!(
            engine.transcribe(&short, "en").unwrap_err(),
            SttError::AudioTooShort
        ));
        let long = vec![0.0f32; MAX_AUDIO_SAMPLES + 1];
        assert!(matches!(
            engine.transcribe(&long, "en").unwrap_err(),
            SttError::AudioTooLong
        ));
    }

    #[test]
    fn load_missing_model_returns_model_not_found() {
        let result = WhisperEngine::load("/nonexistent/model.bin", TranscribeParams::default());
        assert!(
            matches!(result, Err(SttError::ModelNotFound(_))),
            "expected ModelNotFound, got: {result:?}"
        );
    }

    #[test]
    fn fit_audio_pads_short_clips() {
        let out = fit_audio(&[0.5; 100]);
        assert_eq!(out.len(), MIN_AUDIO_SAMPLES);
        assert_eq!(out[99], 0.5);
        assert_eq!(out[100], 0.0);
    }

    #[test]
    fn fit_audio_keeps_the_latest_minute() {
        let mut audio = vec![0.0f32; MAX_AUDIO_SAMPLES + 10];
        *audio.last_mut().unwrap() = 1.0;
        let out = fit_audio(&audio);
        assert_eq!(out.len(), MAX_AUDIO_SAMPLES);
        assert_eq!(*out.last().unwrap(), 1.0);
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            SttError::ModelNotFound("x".into()).kind(),
            VoiceErrorKind::Unsupported
        );
        assert_eq!(SttError::AudioTooShort.kind(), VoiceErrorKind::NoSpeechDetected);
        assert_eq!(
            SttError::Transcription("boom".into()).kind(),
            VoiceErrorKind::Unknown
        );
    }
}

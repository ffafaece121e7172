//! Speech-to-text: Whisper engine, model registry and the microphone-backed
//! recognizer the native platform hands to capture sessions.
//!
//! ```text
//!  ModelPaths::resolve(id) ──▶ WhisperEngine::load ──▶ Arc<dyn SttEngine>
//!                                                          │ shared
//!                                                          ▼
//!                       WhisperRecognizer (one per capture session, one locale)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use civic_voice::stt::{SttEngine, TranscribeParams, WhisperEngine};
//!
//! let engine = WhisperEngine::load("models/ggml-small.bin", TranscribeParams::default())
//!     .expect("model not found");
//!
//! // audio: 16 kHz, mono, f32 PCM
//! let audio: Vec<f32> = vec![0.0; 16_000];
//! println!("{}", engine.transcribe(&audio, "hi").unwrap());
//! ```

pub mod engine;
pub mod model;
pub mod recognizer;
pub mod transcribe;

pub use engine::{fit_audio, SttEngine, SttError, WhisperEngine, MAX_AUDIO_SAMPLES, MIN_AUDIO_SAMPLES};
pub use model::{find_model_by_id, ModelInfo, ModelPaths, ModelSize, MODEL_SOURCE_URL, WHISPER_MODELS};
pub use recognizer::{ListenParams, WhisperRecognizer};
pub use transcribe::{SamplingStrategy, TranscribeParams};

#[cfg(test)]
pub use engine::MockSttEngine;

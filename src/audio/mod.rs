//! Audio input: microphone capture → downmix → resampling → VAD.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → stereo_to_mono
//!           → resample_to_16k → VadDetector (speech? trailing silence?) → Whisper
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::mpsc;
//! use civic_voice::audio::{AudioCapture, AudioChunk};
//!
//! let (tx, rx) = mpsc::channel::<AudioChunk>();
//! let capture = AudioCapture::new().unwrap();
//! let _handle = capture.start(tx).unwrap(); // drops handle → stops stream
//!
//! while let Ok(chunk) = rx.recv() {
//!     println!("received {} samples @ {}Hz", chunk.samples.len(), chunk.sample_rate);
//! }
//! ```

pub mod capture;
pub mod resample;
pub mod vad;

pub use capture::{has_input_device, AudioCapture, AudioChunk, AudioError, StreamHandle};
pub use resample::{resample_to_16k, stereo_to_mono, TARGET_RATE};
pub use vad::VadDetector;

//! Voice input and output for multilingual civic-information screens.
//!
//! ```text
//!  LanguageTag ──resolve──▶ LocaleTag
//!       │                      │
//!       ▼                      ▼
//!  SpeechCaptureSession   SpeechPlaybackChannel     (one of each per screen,
//!       │                      │                      see VoiceSurface)
//!       └──────── SpeechPlatform (trait) ────────┘
//!                 NativePlatform: Whisper + cpal / espeak-ng
//! ```

pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod language;
pub mod messages;
pub mod platform;
pub mod playback;
pub mod stt;
pub mod surface;
pub mod tts;

pub use error::VoiceErrorKind;
pub use language::{resolve, LanguageTag, LocaleTag};
pub use surface::VoiceSurface;

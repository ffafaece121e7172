//! Speech capture: microphone to text, one language per session.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use civic_voice::capture::{CaptureCallbacks, SpeechCaptureSession};
//! use civic_voice::config::AppConfig;
//! use civic_voice::language::LanguageTag;
//! use civic_voice::platform::NativePlatform;
//!
//! let config = AppConfig::default();
//! let platform = Arc::new(NativePlatform::from_config(&config));
//! let mut session = SpeechCaptureSession::with_callbacks(
//!     platform,
//!     LanguageTag::new("hi"),
//!     config.recognition.settings(),
//!     CaptureCallbacks::default().on_final(|text| println!("{text}")),
//! );
//!
//! if session.is_supported() {
//!     session.start();
//!     // later, from the event loop:
//!     session.pump();
//! }
//! ```

pub mod session;
pub mod state;

pub use session::{CaptureCallbacks, SpeechCaptureSession};
pub use state::{CaptureEvent, CaptureState, Transcript};

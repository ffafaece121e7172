//! Speech playback: text to audible speech in the active language.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use civic_voice::config::AppConfig;
//! use civic_voice::language::LanguageTag;
//! use civic_voice::platform::NativePlatform;
//! use civic_voice::playback::SpeechPlaybackChannel;
//!
//! # #[tokio::main] async fn main() {
//! let config = AppConfig::default();
//! let platform = Arc::new(NativePlatform::from_config(&config));
//! let mut channel = SpeechPlaybackChannel::new(
//!     platform,
//!     LanguageTag::new("en"),
//!     config.playback.settings(),
//! );
//! channel.speak("Drink plenty of water and rest.");
//! while let Some(event) = channel.next_event().await {
//!     println!("{event:?}");
//! }
//! # }
//! ```

pub mod channel;

pub use channel::{PlaybackEvent, PlaybackSettings, PlaybackState, SpeechPlaybackChannel};

//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Missing keys fall back
//! to their defaults, so an older `settings.toml` keeps loading.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::language::LanguageTag;
use crate::platform::RecognitionSettings;
use crate::playback::PlaybackSettings;

// ---------------------------------------------------------------------------
// RecognitionConfig
// ---------------------------------------------------------------------------

/// Settings for speech recognition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Whisper model id from [`crate::stt::WHISPER_MODELS`] (e.g. `"whisper-small"`).
    pub model: String,
    /// Report interim transcripts while the user speaks.
    pub interim_results: bool,
    /// Keep listening through pauses until `done` or the length cap.
    pub continuous: bool,
    /// How often an interim transcript is produced while speech is present.
    pub interim_interval_ms: u64,
    /// Trailing silence that ends an utterance.
    pub silence_timeout_ms: u64,
    /// Give up with "no speech" when nothing is heard for this long.
    pub no_speech_timeout_ms: u64,
    /// Hard cap on a single listening attempt.
    pub max_listen_secs: u64,
    /// RMS level above which a 30 ms frame counts as speech.
    pub vad_threshold: f32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            model: "whisper-small".into(),
            interim_results: true,
            continuous: false,
            interim_interval_ms: 1_500,
            silence_timeout_ms: 1_200,
            no_speech_timeout_ms: 8_000,
            max_listen_secs: 30,
            vad_threshold: 0.01,
        }
    }
}

impl RecognitionConfig {
    pub fn settings(&self) -> RecognitionSettings {
        RecognitionSettings {
            interim_results: self.interim_results,
            continuous: self.continuous,
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Settings for text-to-speech playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Speaking-rate multiplier; below 1.0 is slower than normal.
    pub rate: f32,
    /// Pitch multiplier.
    pub pitch: f32,
    /// Volume in `[0.0, 1.0]`.
    pub volume: f32,
    /// Speech synthesizer program (name on `PATH` or absolute path).
    pub program: String,
    /// Extra arguments placed before the generated voice and prosody flags.
    pub args: Vec<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        let defaults = PlaybackSettings::default();
        Self {
            rate: defaults.rate,
            pitch: defaults.pitch,
            volume: defaults.volume,
            program: "espeak-ng".into(),
            args: Vec::new(),
        }
    }
}

impl PlaybackConfig {
    pub fn settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume.clamp(0.0, 1.0),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use civic_voice::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let mut config = AppConfig::load().unwrap();
/// config.language = "en".into();
/// config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Language the user picked.  Owned by the application; the voice
    /// components only read it.
    pub language: LanguageTag,
    pub recognition: RecognitionConfig,
    pub playback: PlaybackConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: LanguageTag::new("hi"),
            recognition: RecognitionConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

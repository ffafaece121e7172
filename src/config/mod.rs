//! Configuration for the voice console.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for recognition and
//! playback, `AppPaths` for cross-platform data directories, and TOML
//! persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, PlaybackConfig, RecognitionConfig};

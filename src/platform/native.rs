//! The platform used outside tests: Whisper on the default microphone for
//! recognition, an external engine binary for synthesis.
//!
//! Everything is probed once at construction, including loading the Whisper
//! model, so `supports_recognition()` means a usable model rather than a
//! file on disk.  Construction can take seconds for large models: build the
//! platform on a blocking thread, before the UI starts taking input.  The
//! loaded engine is shared by every recognizer handed out.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::audio::has_input_device;
use crate::config::{AppConfig, AppPaths, RecognitionConfig};
use crate::language::LocaleTag;
use crate::stt::{
    ListenParams, ModelPaths, SttEngine, TranscribeParams, WhisperEngine, WhisperRecognizer,
};
use crate::tts::{program_available, CommandSynthesizer};

use super::{RecognitionSettings, Recognizer, SpeechPlatform, Synthesizer};

pub struct NativePlatform {
    recognition: RecognitionConfig,
    engine: Option<Arc<dyn SttEngine>>,
    program: PathBuf,
    program_args: Vec<String>,
    program_found: bool,
    runtime: Option<Handle>,
}

impl NativePlatform {
    /// Probe the machine using the model directory from [`AppPaths`].
    ///
    /// Blocks while the speech model loads.  Synthesis additionally needs a
    /// tokio runtime: call this from inside one (a `spawn_blocking` task
    /// counts), otherwise synthesis is reported as unsupported.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_models(config, ModelPaths::from_app_paths(&AppPaths::new()))
    }

    pub fn with_models(config: &AppConfig, models: ModelPaths) -> Self {
        let engine = if has_input_device() {
            load_engine(&config.recognition, &models)
        } else {
            log::warn!("no microphone found; voice input disabled");
            None
        };

        let program = PathBuf::from(&config.playback.program);
        let program_found = program_available(&program);
        if !program_found {
            log::warn!(
                "speech engine '{}' not found; voice output disabled",
                program.display()
            );
        }

        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            log::warn!("no tokio runtime; voice output disabled");
        }

        Self {
            recognition: config.recognition.clone(),
            engine,
            program,
            program_args: config.playback.args.clone(),
            program_found,
            runtime,
        }
    }
}

fn load_engine(config: &RecognitionConfig, models: &ModelPaths) -> Option<Arc<dyn SttEngine>> {
    let Some(path) = models.resolve(&config.model) else {
        log::warn!(
            "speech model '{}' not found in {}; voice input disabled",
            config.model,
            models.models_dir.display()
        );
        return None;
    };
    match WhisperEngine::load(&path, TranscribeParams::default()) {
        Ok(engine) => Some(Arc::new(engine) as Arc<dyn SttEngine>),
        Err(e) => {
            log::warn!("failed to load speech model: {e}; voice input disabled");
            None
        }
    }
}

impl SpeechPlatform for NativePlatform {
    fn supports_recognition(&self) -> bool {
        self.engine.is_some()
    }

    fn supports_synthesis(&self) -> bool {
        self.program_found && self.runtime.is_some()
    }

    fn create_recognizer(
        &self,
        locale: &LocaleTag,
        settings: &RecognitionSettings,
    ) -> Option<Box<dyn Recognizer>> {
        let engine = Arc::clone(self.engine.as_ref()?);
        log::debug!("creating recognizer for {locale}");
        Some(Box::new(WhisperRecognizer::new(
            locale.clone(),
            engine,
            ListenParams::new(&self.recognition, settings),
        )))
    }

    fn create_synthesizer(&self) -> Option<Box<dyn Synthesizer>> {
        if !self.program_found {
            return None;
        }
        let runtime = self.runtime.clone()?;
        Some(Box::new(CommandSynthesizer::new(
            self.program.clone(),
            self.program_args.clone(),
            runtime,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Capabilities;
    use tempfile::tempdir;

    fn config_with_program(program: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.playback.program = program.into();
        config
    }

    #[test]
    fn missing_model_disables_recognition() {
        let dir = tempdir().expect("temp dir");
        let platform =
            NativePlatform::with_models(&AppConfig::default(), ModelPaths::new(dir.path()));
        assert!(!platform.supports_recognition());
        let locale = crate::language::resolve(&"hi".into());
        assert!(platform
            .create_recognizer(&locale, &RecognitionSettings::default())
            .is_none());
    }

    #[test]
    fn missing_program_disables_synthesis() {
        let dir = tempdir().expect("temp dir");
        let config = config_with_program("/nonexistent/espeak-ng");
        let platform = NativePlatform::with_models(&config, ModelPaths::new(dir.path()));
        assert!(!platform.supports_synthesis());
        assert!(platform.create_synthesizer().is_none());
        assert!(Capabilities::probe(&platform).text_only());
    }

    #[test]
    fn synthesis_needs_a_runtime() {
        let dir = tempdir().expect("temp dir");
        let config = config_with_program("sh");
        let platform = NativePlatform::with_models(&config, ModelPaths::new(dir.path()));
        assert!(!platform.supports_synthesis());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn available_program_inside_runtime_enables_synthesis() {
        let dir = tempdir().expect("temp dir");
        let config = config_with_program("sh");
        let platform = NativePlatform::with_models(&config, ModelPaths::new(dir.path()));
        assert!(platform.supports_synthesis());
        assert!(platform.create_synthesizer().is_some());
    }

    #[test]
    fn unloadable_model_is_reported_unsupported_up_front() {
        let dir = tempdir().expect("temp dir");
        std::fs::write(dir.path().join("ggml-small.bin"), b"not a model").unwrap();
        let platform =
            NativePlatform::with_models(&AppConfig::default(), ModelPaths::new(dir.path()));
        assert!(!platform.supports_recognition());
        let locale = crate::language::resolve(&"en".into());
        assert!(platform
            .create_recognizer(&locale, &RecognitionSettings::default())
            .is_none());
    }

    #[test]
    fn unloadable_model_fails_to_load() {
        let dir = tempdir().expect("temp dir");
        std::fs::write(dir.path().join("ggml-small.bin"), b"not a model").unwrap();
        let engine = load_engine(
            &AppConfig::default().recognition,
            &ModelPaths::new(dir.path()),
        );
        assert!(engine.is_none());
    }
}

//! [`VoiceSurface`]: the capture session and playback channel a UI screen
//! owns, kept on the same language.
//!
//! The surface only composes: capture never triggers playback and playback
//! never triggers capture.  Reading a result back aloud is the caller's
//! decision.

use std::sync::Arc;

use crate::capture::{CaptureCallbacks, SpeechCaptureSession};
use crate::language::LanguageTag;
use crate::platform::{Capabilities, RecognitionSettings, SpeechPlatform};
use crate::playback::{PlaybackSettings, SpeechPlaybackChannel};

pub struct VoiceSurface {
    platform: Arc<dyn SpeechPlatform>,
    language: LanguageTag,
    capture: SpeechCaptureSession,
    playback: SpeechPlaybackChannel,
}

impl VoiceSurface {
    pub fn new(
        platform: Arc<dyn SpeechPlatform>,
        language: LanguageTag,
        recognition: RecognitionSettings,
        playback: PlaybackSettings,
        callbacks: CaptureCallbacks,
    ) -> Self {
        let capture = SpeechCaptureSession::with_callbacks(
            Arc::clone(&platform),
            language.clone(),
            recognition,
            callbacks,
        );
        let playback =
            SpeechPlaybackChannel::new(Arc::clone(&platform), language.clone(), playback);
        Self {
            platform,
            language,
            capture,
            playback,
        }
    }

    /// Switch both components to `language`.
    ///
    /// Listening is abandoned and speech is cut off before the components are
    /// rebuilt; capture callbacks carry over.  Nothing happens when the
    /// language is unchanged.
    pub fn set_language(&mut self, language: LanguageTag) {
        if language == self.language {
            return;
        }
        log::info!("voice surface: language {} -> {language}", self.language);

        self.capture.stop();
        self.playback.stop();

        let callbacks = self.capture.take_callbacks();
        let recognition = self.capture.settings().clone();
        let playback = self.playback.settings();

        self.capture = SpeechCaptureSession::with_callbacks(
            Arc::clone(&self.platform),
            language.clone(),
            recognition,
            callbacks,
        );
        self.playback =
            SpeechPlaybackChannel::new(Arc::clone(&self.platform), language.clone(), playback);
        self.language = language;
    }

    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            recognition: self.capture.is_supported(),
            synthesis: self.playback.is_supported(),
        }
    }

    pub fn capture(&self) -> &SpeechCaptureSession {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut SpeechCaptureSession {
        &mut self.capture
    }

    pub fn playback(&self) -> &SpeechPlaybackChannel {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut SpeechPlaybackChannel {
        &mut self.playback
    }
}

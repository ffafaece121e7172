//! [`SpeechPlaybackChannel`]: read text aloud, one utterance at a time.
//!
//! `speak()` always cancels whatever this channel is saying before starting
//! the new utterance: last write wins, nothing is queued.  Each utterance is
//! a new generation, so `Ended`/`Error` events from a cut-off utterance are
//! ignored and can never flip a newer utterance back to `Idle`.
//!
//! Synthesis failures are logged and swallowed; the caller's text stays on
//! screen regardless.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::VoiceErrorKind;
use crate::language::{resolve, LanguageTag, LocaleTag};
use crate::platform::{
    EventSink, Generation, SpeechPlatform, Stamped, SynthesisEvent, Synthesizer, Utterance,
};

// ---------------------------------------------------------------------------
// PlaybackState / PlaybackEvent / PlaybackSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking,
}

/// What a caller observes from a playback channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    /// The utterance played to the end.
    Finished,
    /// The utterance failed; the channel is back to `Idle`.
    Failed(VoiceErrorKind),
}

/// Voice parameters applied to every utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    /// Slightly slower than normal speech so instructions are easy to follow.
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechPlaybackChannel
// ---------------------------------------------------------------------------

pub struct SpeechPlaybackChannel {
    platform: Arc<dyn SpeechPlatform>,
    language: LanguageTag,
    locale: LocaleTag,
    settings: PlaybackSettings,
    supported: bool,
    synthesizer: Option<Box<dyn Synthesizer>>,
    state: PlaybackState,
    generation: Generation,
    active: Option<Generation>,
    last_error: Option<VoiceErrorKind>,
    tx: mpsc::UnboundedSender<Stamped<SynthesisEvent>>,
    rx: mpsc::UnboundedReceiver<Stamped<SynthesisEvent>>,
}

impl SpeechPlaybackChannel {
    pub fn new(
        platform: Arc<dyn SpeechPlatform>,
        language: LanguageTag,
        settings: PlaybackSettings,
    ) -> Self {
        let locale = resolve(&language);
        let supported = platform.supports_synthesis();
        if !supported {
            log::info!("playback[{language}]: speech synthesis not supported on this platform");
        }
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            platform,
            language,
            locale,
            settings,
            supported,
            synthesizer: None,
            state: PlaybackState::Idle,
            generation: 0,
            active: None,
            last_error: None,
            tx,
            rx,
        }
    }

    /// Cut off any playback and build a fresh channel for `language`.
    pub fn rebuild_for(mut self, language: LanguageTag) -> Self {
        self.stop();
        let platform = Arc::clone(&self.platform);
        let settings = self.settings;
        drop(self);
        Self::new(platform, language, settings)
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_speaking(&self) -> bool {
        self.state == PlaybackState::Speaking
    }

    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    pub fn locale(&self) -> &LocaleTag {
        &self.locale
    }

    pub fn settings(&self) -> PlaybackSettings {
        self.settings
    }

    pub fn last_error(&self) -> Option<VoiceErrorKind> {
        self.last_error
    }

    /// Speak `text`, cutting off anything this channel is still saying.
    ///
    /// Blank text only cancels.  Never fails: a refused utterance is logged
    /// and leaves the channel `Idle`.
    pub fn speak(&mut self, text: &str) {
        if !self.supported {
            log::debug!("playback[{}]: speak ignored, unsupported", self.language);
            return;
        }
        if self.synthesizer.is_none() {
            self.synthesizer = self.platform.create_synthesizer();
        }
        let Some(synthesizer) = self.synthesizer.as_mut() else {
            log::warn!("playback[{}]: platform refused to build a synthesizer", self.language);
            self.supported = false;
            return;
        };

        synthesizer.cancel_all();
        self.active = None;
        self.state = PlaybackState::Idle;

        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let utterance = Utterance {
            text: text.to_string(),
            locale: self.locale.clone(),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            volume: self.settings.volume,
        };

        match synthesizer.speak(utterance, EventSink::new(generation, self.tx.clone())) {
            Ok(()) => {
                self.last_error = None;
                self.active = Some(generation);
                self.state = PlaybackState::Speaking;
                log::debug!("playback[{}]: speaking utterance {generation}", self.language);
            }
            Err(kind) => {
                log::warn!("playback[{}]: could not speak: {kind}", self.language);
                self.last_error = Some(kind);
            }
        }
    }

    /// Cancel playback.  `Idle` as soon as this returns.
    pub fn stop(&mut self) {
        if let Some(synthesizer) = self.synthesizer.as_mut() {
            synthesizer.cancel_all();
        }
        self.active = None;
        self.state = PlaybackState::Idle;
    }

    /// Apply every synthesis event queued so far.
    pub fn pump(&mut self) -> Vec<PlaybackEvent> {
        let mut delivered = Vec::new();
        while let Ok(stamped) = self.rx.try_recv() {
            if let Some(event) = self.apply(stamped) {
                delivered.push(event);
            }
        }
        delivered
    }

    /// Wait for the next event of the current utterance; `None` once idle.
    pub async fn next_event(&mut self) -> Option<PlaybackEvent> {
        loop {
            if self.active.is_none() {
                while self.rx.try_recv().is_ok() {}
                return None;
            }
            let stamped = self.rx.recv().await?;
            if let Some(event) = self.apply(stamped) {
                return Some(event);
            }
        }
    }

    fn apply(&mut self, stamped: Stamped<SynthesisEvent>) -> Option<PlaybackEvent> {
        if self.active != Some(stamped.generation) {
            log::debug!(
                "playback[{}]: dropping stale {:?} from utterance {}",
                self.language,
                stamped.event,
                stamped.generation
            );
            return None;
        }
        match stamped.event {
            SynthesisEvent::Started => Some(PlaybackEvent::Started),
            SynthesisEvent::Ended => {
                self.active = None;
                self.state = PlaybackState::Idle;
                Some(PlaybackEvent::Finished)
            }
            SynthesisEvent::Error(kind) => {
                log::warn!("playback[{}]: synthesis failed: {kind}", self.language);
                self.active = None;
                self.state = PlaybackState::Idle;
                self.last_error = Some(kind);
                Some(PlaybackEvent::Failed(kind))
            }
        }
    }
}

impl Drop for SpeechPlaybackChannel {
    fn drop(&mut self) {
        if self.active.take().is_some() {
            if let Some(synthesizer) = self.synthesizer.as_mut() {
                synthesizer.cancel_all();
            }
        }
    }
}

impl fmt::Debug for SpeechPlaybackChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechPlaybackChannel")
            .field("language", &self.language)
            .field("locale", &self.locale)
            .field("supported", &self.supported)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! [`SpeechCaptureSession`]: one microphone-to-text session per UI surface.
//!
//! The session owns a lazily built [`Recognizer`] for its locale and a
//! private event channel.  Each listening attempt gets a fresh generation;
//! only events stamped with the active generation are applied, so results
//! from a stopped attempt, a trailing `End` after `stop()`, or interims after
//! the final result all fall through as no-ops.
//!
//! Events are applied on the caller's thread, either synchronously with
//! [`pump`](SpeechCaptureSession::pump) or by awaiting
//! [`next_event`](SpeechCaptureSession::next_event).  Registered callbacks
//! fire while an event is applied, in engine order.  A start the platform
//! refuses fires `on_error` at once and is also queued, so the next `pump`
//! or `next_event` returns the same error.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::VoiceErrorKind;
use crate::language::{resolve, LanguageTag, LocaleTag};
use crate::platform::{
    EventSink, Generation, RecognitionEvent, RecognitionSettings, Recognizer, SpeechPlatform,
    Stamped,
};

use super::state::{CaptureEvent, CaptureState, Transcript};

// ---------------------------------------------------------------------------
// CaptureCallbacks
// ---------------------------------------------------------------------------

type TextCallback = Box<dyn FnMut(&str)>;
type ErrorCallback = Box<dyn FnMut(VoiceErrorKind)>;

/// Optional observers for a capture session.
///
/// ```
/// use civic_voice::capture::CaptureCallbacks;
///
/// let callbacks = CaptureCallbacks::default()
///     .on_interim(|text| println!("… {text}"))
///     .on_final(|text| println!("you said: {text}"))
///     .on_error(|kind| eprintln!("{kind}"));
/// ```
#[derive(Default)]
pub struct CaptureCallbacks {
    interim: Option<TextCallback>,
    final_result: Option<TextCallback>,
    error: Option<ErrorCallback>,
}

impl CaptureCallbacks {
    pub fn on_interim(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.interim = Some(Box::new(f));
        self
    }

    pub fn on_final(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.final_result = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(VoiceErrorKind) + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for CaptureCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureCallbacks")
            .field("interim", &self.interim.is_some())
            .field("final_result", &self.final_result.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SpeechCaptureSession
// ---------------------------------------------------------------------------

/// Speech-to-text for one language.
///
/// Changing language means building a new session
/// ([`rebuild_for`](Self::rebuild_for)); the locale is fixed for the
/// lifetime of an instance.
pub struct SpeechCaptureSession {
    platform: Arc<dyn SpeechPlatform>,
    language: LanguageTag,
    locale: LocaleTag,
    settings: RecognitionSettings,
    supported: bool,
    recognizer: Option<Box<dyn Recognizer>>,
    state: CaptureState,
    generation: Generation,
    /// Generation of the attempt currently accepting events.
    active: Option<Generation>,
    transcript: String,
    last_error: Option<VoiceErrorKind>,
    /// Error from a refused start, not yet handed to the caller.
    pending: Option<CaptureEvent>,
    callbacks: CaptureCallbacks,
    tx: mpsc::UnboundedSender<Stamped<RecognitionEvent>>,
    rx: mpsc::UnboundedReceiver<Stamped<RecognitionEvent>>,
}

impl SpeechCaptureSession {
    pub fn new(
        platform: Arc<dyn SpeechPlatform>,
        language: LanguageTag,
        settings: RecognitionSettings,
    ) -> Self {
        Self::with_callbacks(platform, language, settings, CaptureCallbacks::default())
    }

    /// Build a session and probe the platform once for recognition support.
    pub fn with_callbacks(
        platform: Arc<dyn SpeechPlatform>,
        language: LanguageTag,
        settings: RecognitionSettings,
        callbacks: CaptureCallbacks,
    ) -> Self {
        let locale = resolve(&language);
        let supported = platform.supports_recognition();
        if !supported {
            log::info!("capture[{language}]: speech recognition not supported on this platform");
        }
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            platform,
            language,
            locale,
            settings,
            supported,
            recognizer: None,
            state: CaptureState::Idle,
            generation: 0,
            active: None,
            transcript: String::new(),
            last_error: None,
            pending: None,
            callbacks,
            tx,
            rx,
        }
    }

    /// Tear this session down and build a fresh one for `language`.
    ///
    /// Any listening attempt is stopped first and its interim text
    /// discarded.  Callbacks move to the new session; the new session
    /// starts `Idle`.
    pub fn rebuild_for(mut self, language: LanguageTag) -> Self {
        self.stop();
        let callbacks = self.take_callbacks();
        let platform = Arc::clone(&self.platform);
        let settings = self.settings.clone();
        drop(self);
        Self::with_callbacks(platform, language, settings, callbacks)
    }

    pub(crate) fn take_callbacks(&mut self) -> CaptureCallbacks {
        std::mem::take(&mut self.callbacks)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state.is_active()
    }

    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    pub fn locale(&self) -> &LocaleTag {
        &self.locale
    }

    pub fn settings(&self) -> &RecognitionSettings {
        &self.settings
    }

    /// Latest interim text during an attempt, the final text after one.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn last_error(&self) -> Option<VoiceErrorKind> {
        self.last_error
    }

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------

    /// Begin a listening attempt.
    ///
    /// No-op when unsupported or when an attempt is already running.  A
    /// platform refusal is reported through `on_error` and queued for
    /// `pump`/`next_event`, never returned.
    pub fn start(&mut self) {
        if !self.supported {
            log::debug!("capture[{}]: start ignored, unsupported", self.language);
            return;
        }
        if self.state.is_active() {
            log::debug!("capture[{}]: start ignored, already {}", self.language, self.state.label());
            return;
        }

        if self.recognizer.is_none() {
            self.recognizer = self.platform.create_recognizer(&self.locale, &self.settings);
        }

        self.generation += 1;
        let generation = self.generation;
        self.transcript.clear();
        self.last_error = None;
        self.pending = None;
        self.active = Some(generation);
        self.state = CaptureState::Listening;

        let Some(recognizer) = self.recognizer.as_mut() else {
            log::warn!("capture[{}]: platform refused to build a recognizer", self.language);
            self.pending = Some(self.fail(VoiceErrorKind::Unsupported));
            return;
        };

        let sink = EventSink::new(generation, self.tx.clone());
        match recognizer.start(sink) {
            Ok(()) => {
                log::debug!("capture[{}]: listening (attempt {generation})", self.language);
            }
            Err(kind) => {
                recognizer.abort();
                self.pending = Some(self.fail(kind));
            }
        }
    }

    /// Cancel the current attempt, discarding interim text.  No callback
    /// fires for the abandoned utterance.  Safe to call at any time.
    pub fn stop(&mut self) {
        let Some(generation) = self.active.take() else {
            return;
        };
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.abort();
        }
        self.transcript.clear();
        self.state = CaptureState::Idle;
        log::debug!("capture[{}]: stopped attempt {generation}", self.language);
    }

    /// Ask the engine to stop listening and deliver its final result.
    /// Only meaningful while `Listening`.
    pub fn finish(&mut self) {
        if self.state != CaptureState::Listening {
            return;
        }
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.finish();
        }
        self.state = CaptureState::Finalizing;
    }

    // -----------------------------------------------------------------------
    // Event delivery
    // -----------------------------------------------------------------------

    /// Apply every event the engine has queued so far.
    pub fn pump(&mut self) -> Vec<CaptureEvent> {
        let mut delivered: Vec<CaptureEvent> = self.pending.take().into_iter().collect();
        while let Ok(stamped) = self.rx.try_recv() {
            if let Some(event) = self.apply(stamped) {
                delivered.push(event);
            }
        }
        delivered
    }

    /// Wait for the next deliverable event of the current attempt.
    ///
    /// Returns `None` once no attempt is active, including when the attempt
    /// ended without a final result.  A queued start refusal is returned
    /// first.
    pub async fn next_event(&mut self) -> Option<CaptureEvent> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }
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

    fn apply(&mut self, stamped: Stamped<RecognitionEvent>) -> Option<CaptureEvent> {
        if self.active != Some(stamped.generation) {
            log::debug!(
                "capture[{}]: dropping stale {:?} from attempt {}",
                self.language,
                stamped.event,
                stamped.generation
            );
            return None;
        }

        match stamped.event {
            RecognitionEvent::Result(transcript) if !transcript.is_final => {
                self.transcript.clone_from(&transcript.text);
                if let Some(cb) = self.callbacks.interim.as_mut() {
                    cb(&transcript.text);
                }
                Some(CaptureEvent::Interim(transcript))
            }
            RecognitionEvent::Result(transcript) => {
                let text = transcript.text.trim();
                if text.is_empty() {
                    return Some(self.fail(VoiceErrorKind::NoSpeechDetected));
                }
                let text = text.to_string();
                self.active = None;
                self.release_recognizer();
                self.transcript.clone_from(&text);
                if let Some(cb) = self.callbacks.final_result.as_mut() {
                    cb(&text);
                }
                self.state = CaptureState::Idle;
                log::debug!("capture[{}]: final result ({} chars)", self.language, text.len());
                Some(CaptureEvent::Final(Transcript::final_text(text)))
            }
            RecognitionEvent::Error(kind) => Some(self.fail(kind)),
            RecognitionEvent::End => {
                log::debug!("capture[{}]: engine ended without a final result", self.language);
                self.active = None;
                self.release_recognizer();
                self.state = CaptureState::Idle;
                None
            }
        }
    }

    /// End the current attempt with `kind`: Error → `on_error` → Idle.
    fn fail(&mut self, kind: VoiceErrorKind) -> CaptureEvent {
        log::info!("capture[{}]: {kind}", self.language);
        self.active = None;
        self.release_recognizer();
        self.state = CaptureState::Error;
        self.last_error = Some(kind);
        if let Some(cb) = self.callbacks.error.as_mut() {
            cb(kind);
        }
        self.state = CaptureState::Idle;
        CaptureEvent::Error(kind)
    }

    fn release_recognizer(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.abort();
        }
    }
}

impl Drop for SpeechCaptureSession {
    fn drop(&mut self) {
        if self.active.take().is_some() {
            if let Some(recognizer) = self.recognizer.as_mut() {
                recognizer.abort();
            }
        }
    }
}

impl fmt::Debug for SpeechCaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechCaptureSession")
            .field("language", &self.language)
            .field("locale", &self.locale)
            .field("supported", &self.supported)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

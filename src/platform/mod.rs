//! Speech platform seam.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────── SpeechPlatform (trait) ─────────────────────┐
//! │  supports_recognition() / supports_synthesis()   capability probe │
//! │  create_recognizer(locale) ──▶ Box<dyn Recognizer>                │
//! │  create_synthesizer()      ──▶ Box<dyn Synthesizer>               │
//! └───────────────────────────────────────────────────────────────────┘
//!        │ start(sink)                         │ speak(utterance, sink)
//!        ▼                                     ▼
//!  RecognitionSink ──Stamped<RecognitionEvent>──▶ SpeechCaptureSession
//!  SynthesisSink   ──Stamped<SynthesisEvent>────▶ SpeechPlaybackChannel
//! ```
//!
//! Every sink is stamped with the generation (listening attempt or utterance
//! id) it was handed out for.  Components only accept events carrying their
//! current generation, so late events from a cancelled attempt are dropped
//! without any extra bookkeeping.
//!
//! # Usage constraint
//!
//! The microphone and the audio output are shared by every component in the
//! process.  Each component cancels only its own in-flight work; running two
//! capture sessions at once is a caller error and is not guarded against.

pub mod native;

#[cfg(test)]
pub mod mock;

use std::fmt;

use tokio::sync::mpsc;

use crate::capture::Transcript;
use crate::error::VoiceErrorKind;
use crate::language::LocaleTag;

pub use native::NativePlatform;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Listening-attempt or utterance identifier.
pub type Generation = u64;

/// Raw events a [`Recognizer`] reports for one listening attempt, in the
/// order the engine produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// Interim or final transcript.
    Result(Transcript),
    /// The attempt failed.
    Error(VoiceErrorKind),
    /// The engine stopped listening.  May arrive after a result, after an
    /// error, or after the attempt was already cancelled.
    End,
}

/// Raw events a [`Synthesizer`] reports for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisEvent {
    Started,
    Ended,
    Error(VoiceErrorKind),
}

/// An event tagged with the generation of the sink that emitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<E> {
    pub generation: Generation,
    pub event: E,
}

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// Cloneable, thread-safe handle a backend uses to report events.
///
/// Sends never block and never fail loudly: once the owning component is
/// gone the events are silently discarded.
pub struct EventSink<E> {
    generation: Generation,
    tx: mpsc::UnboundedSender<Stamped<E>>,
}

pub type RecognitionSink = EventSink<RecognitionEvent>;
pub type SynthesisSink = EventSink<SynthesisEvent>;

impl<E> EventSink<E> {
    pub(crate) fn new(generation: Generation, tx: mpsc::UnboundedSender<Stamped<E>>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Report `event`.  Returns `false` when the receiving component has
    /// been dropped.
    pub fn emit(&self, event: E) -> bool {
        self.tx
            .send(Stamped {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

impl<E> Clone for EventSink<E> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            tx: self.tx.clone(),
        }
    }
}

impl<E> fmt::Debug for EventSink<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Settings / requests
// ---------------------------------------------------------------------------

/// Recognition behaviour bound at recognizer construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionSettings {
    /// Report interim transcripts while the user is still speaking.
    pub interim_results: bool,
    /// Keep listening through pauses; the single final result arrives on
    /// `finish()` or when the length cap is reached.
    pub continuous: bool,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            interim_results: true,
            continuous: false,
        }
    }
}

/// A single text-to-speech request.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub locale: LocaleTag,
    /// Speaking rate multiplier, 1.0 = engine default.
    pub rate: f32,
    /// Pitch multiplier, 1.0 = engine default.
    pub pitch: f32,
    /// Volume in `[0.0, 1.0]`.
    pub volume: f32,
}

/// Result of probing a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub recognition: bool,
    pub synthesis: bool,
}

impl Capabilities {
    pub fn probe(platform: &dyn SpeechPlatform) -> Self {
        Self {
            recognition: platform.supports_recognition(),
            synthesis: platform.supports_synthesis(),
        }
    }

    /// `true` when the UI has to fall back to text only.
    pub fn text_only(&self) -> bool {
        !self.recognition && !self.synthesis
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A speech-to-text engine bound to one locale.
///
/// One recognizer belongs to exactly one capture session.  Implementations
/// report everything asynchronously through the sink passed to
/// [`start`](Recognizer::start).
pub trait Recognizer {
    fn locale(&self) -> &LocaleTag;

    /// Open the microphone and begin a listening attempt.
    ///
    /// An `Err` means the attempt never started; no events will follow for
    /// this sink.
    fn start(&mut self, sink: RecognitionSink) -> Result<(), VoiceErrorKind>;

    /// Stop capturing audio and finalise what has been heard.  A final
    /// result (or an error) followed by `End` is expected afterwards.
    fn finish(&mut self);

    /// Stop immediately, discard pending audio and release the microphone.
    ///
    /// Must be idempotent and safe to call after the attempt already ended.
    fn abort(&mut self);
}

/// A text-to-speech engine.  One synthesizer belongs to one playback channel.
pub trait Synthesizer {
    /// Begin speaking `utterance`.  An `Err` means nothing will be heard and
    /// no events will follow for this sink.
    fn speak(&mut self, utterance: Utterance, sink: SynthesisSink) -> Result<(), VoiceErrorKind>;

    /// Cut off everything this synthesizer is currently saying.
    fn cancel_all(&mut self);
}

/// Capability probe and factory for speech engines.
pub trait SpeechPlatform: Send + Sync {
    fn supports_recognition(&self) -> bool;

    fn supports_synthesis(&self) -> bool;

    /// Build a recognizer for `locale`, or `None` when recognition is not
    /// available.
    fn create_recognizer(
        &self,
        locale: &LocaleTag,
        settings: &RecognitionSettings,
    ) -> Option<Box<dyn Recognizer>>;

    /// Build a synthesizer, or `None` when synthesis is not available.
    fn create_synthesizer(&self) -> Option<Box<dyn Synthesizer>>;
}

// Compile-time assertion: the traits must stay object-safe.
const _: fn() = || {
    fn _recognizer(_: Box<dyn Recognizer>) {}
    fn _synthesizer(_: Box<dyn Synthesizer>) {}
    fn _platform(_: Box<dyn SpeechPlatform>) {}
};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_stamps_events_with_its_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink: RecognitionSink = EventSink::new(7, tx);
        assert!(sink.emit(RecognitionEvent::End));

        let stamped = rx.try_recv().unwrap();
        assert_eq!(stamped.generation, 7);
        assert_eq!(stamped.event, RecognitionEvent::End);
    }

    #[test]
    fn cloned_sink_keeps_generation() {
        let (tx, _rx) = mpsc::unbounded_channel::<Stamped<SynthesisEvent>>();
        let sink = EventSink::new(3, tx);
        assert_eq!(sink.clone().generation(), 3);
    }

    #[test]
    fn emit_after_receiver_dropped_returns_false() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink: SynthesisSink = EventSink::new(1, tx);
        drop(rx);
        assert!(!sink.emit(SynthesisEvent::Ended));
    }

    #[test]
    fn sinks_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<RecognitionSink>();
        assert_send::<SynthesisSink>();
    }

    #[test]
    fn default_recognition_settings_match_single_shot_interim() {
        let s = RecognitionSettings::default();
        assert!(s.interim_results);
        assert!(!s.continuous);
    }

    #[test]
    fn text_only_when_nothing_supported() {
        assert!(Capabilities::default().text_only());
        let partial = Capabilities {
            recognition: false,
            synthesis: true,
        };
        assert!(!partial.text_only());
    }
}

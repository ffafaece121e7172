//! Scripted test double for [`SpeechPlatform`].
//!
//! Records every call made by the components and keeps the sinks handed to
//! the backends so tests can play the engine's part, including sending late
//! events after a cancel.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::VoiceErrorKind;
use crate::language::LocaleTag;

use super::{
    RecognitionEvent, RecognitionSettings, RecognitionSink, Recognizer, SpeechPlatform,
    SynthesisEvent, SynthesisSink, Synthesizer, Utterance,
};

/// Everything the mock backends observed.
#[derive(Debug, Default)]
pub struct MockLog {
    pub recognizers_created: Vec<&'static str>,
    pub starts: usize,
    pub finishes: usize,
    pub aborts: usize,
    /// Number of recognizers currently holding the microphone.
    pub active_captures: usize,
    /// Highest value `active_captures` ever reached.
    pub peak_captures: usize,
    pub recognition_sinks: Vec<RecognitionSink>,
    pub synthesizers_created: usize,
    pub spoken: Vec<Utterance>,
    pub cancels: usize,
    pub synthesis_sinks: Vec<SynthesisSink>,
    /// When set, the next `Recognizer::start` fails with this kind.
    pub fail_start: Option<VoiceErrorKind>,
    /// When set, every `Synthesizer::speak` fails with this kind.
    pub fail_speak: Option<VoiceErrorKind>,
    /// When set, `create_recognizer` returns `None` despite the probe.
    pub refuse_recognizer: bool,
}

pub struct MockPlatform {
    log: Arc<Mutex<MockLog>>,
    recognition: bool,
    synthesis: bool,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(MockLog::default())),
            recognition: true,
            synthesis: true,
        }
    }

    pub fn without_recognition() -> Self {
        Self {
            recognition: false,
            ..Self::new()
        }
    }

    pub fn without_synthesis() -> Self {
        Self {
            synthesis: false,
            ..Self::new()
        }
    }

    pub fn log(&self) -> MutexGuard<'_, MockLog> {
        self.log.lock().unwrap()
    }

    /// Emit `event` on the sink from the most recent `start`.
    pub fn emit_recognition(&self, event: RecognitionEvent) {
        let sink = self.log().recognition_sinks.last().cloned().expect("no recognizer started");
        sink.emit(event);
    }

    /// Emit `event` on the sink from the `index`-th `start`.
    pub fn emit_recognition_on(&self, index: usize, event: RecognitionEvent) {
        let sink = self.log().recognition_sinks[index].clone();
        sink.emit(event);
    }

    /// Emit `event` on the sink from the most recent `speak`.
    pub fn emit_synthesis(&self, event: SynthesisEvent) {
        let sink = self.log().synthesis_sinks.last().cloned().expect("nothing spoken");
        sink.emit(event);
    }

    pub fn emit_synthesis_on(&self, index: usize, event: SynthesisEvent) {
        let sink = self.log().synthesis_sinks[index].clone();
        sink.emit(event);
    }
}

impl SpeechPlatform for MockPlatform {
    fn supports_recognition(&self) -> bool {
        self.recognition
    }

    fn supports_synthesis(&self) -> bool {
        self.synthesis
    }

    fn create_recognizer(
        &self,
        locale: &LocaleTag,
        _settings: &RecognitionSettings,
    ) -> Option<Box<dyn Recognizer>> {
        if !self.recognition || self.log().refuse_recognizer {
            return None;
        }
        self.log().recognizers_created.push(locale.as_str());
        Some(Box::new(MockRecognizer {
            log: Arc::clone(&self.log),
            locale: locale.clone(),
            capturing: false,
        }))
    }

    fn create_synthesizer(&self) -> Option<Box<dyn Synthesizer>> {
        if !self.synthesis {
            return None;
        }
        self.log().synthesizers_created += 1;
        Some(Box::new(MockSynthesizer {
            log: Arc::clone(&self.log),
        }))
    }
}

struct MockRecognizer {
    log: Arc<Mutex<MockLog>>,
    locale: LocaleTag,
    capturing: bool,
}

impl MockRecognizer {
    fn release(&mut self, log: &mut MockLog) {
        if self.capturing {
            self.capturing = false;
            log.active_captures -= 1;
        }
    }
}

impl Recognizer for MockRecognizer {
    fn locale(&self) -> &LocaleTag {
        &self.locale
    }

    fn start(&mut self, sink: RecognitionSink) -> Result<(), VoiceErrorKind> {
        let log = Arc::clone(&self.log);
        let mut log = log.lock().unwrap();
        log.starts += 1;
        if let Some(kind) = log.fail_start.take() {
            return Err(kind);
        }
        if !self.capturing {
            self.capturing = true;
            log.active_captures += 1;
            log.peak_captures = log.peak_captures.max(log.active_captures);
        }
        log.recognition_sinks.push(sink);
        Ok(())
    }

    fn finish(&mut self) {
        self.log.lock().unwrap().finishes += 1;
    }

    fn abort(&mut self) {
        let log = Arc::clone(&self.log);
        let mut log = log.lock().unwrap();
        log.aborts += 1;
        self.release(&mut log);
    }
}

impl Drop for MockRecognizer {
    fn drop(&mut self) {
        let log = Arc::clone(&self.log);
        if let Ok(mut log) = log.lock() {
            self.release(&mut log);
        };
    }
}

struct MockSynthesizer {
    log: Arc<Mutex<MockLog>>,
}

impl Synthesizer for MockSynthesizer {
    fn speak(&mut self, utterance: Utterance, sink: SynthesisSink) -> Result<(), VoiceErrorKind> {
        let mut log = self.log.lock().unwrap();
        if let Some(kind) = log.fail_speak {
            return Err(kind);
        }
        log.spoken.push(utterance);
        log.synthesis_sinks.push(sink);
        Ok(())
    }

    fn cancel_all(&mut self) {
        self.log.lock().unwrap().cancels += 1;
    }
}

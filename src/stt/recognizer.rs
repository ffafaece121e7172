//! Microphone-backed [`Recognizer`] driven by an [`SttEngine`].
//!
//! ```text
//!  cpal callback ──AudioChunk──▶ "whisper-listen" thread
//!                                 ├─ downmix + resample to 16 kHz
//!                                 ├─ VAD per chunk (speech heard? silence since?)
//!                                 ├─ every interim_interval: transcribe → Result(interim)
//!                                 └─ on silence / finish / max length:
//!                                      trim silence → transcribe → Result(final) → End
//! ```
//!
//! In continuous mode trailing silence does not end the attempt: pauses are
//! kept in the buffer and a single final covering everything said is
//! produced on `finish()` or at the length limit.
//!
//! Elapsed time is measured in captured audio, not wall-clock time, so the
//! timeouts behave the same however fast chunks arrive.  A microphone that
//! stops delivering chunks altogether is reported as an audio-capture error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::audio::{
    resample_to_16k, stereo_to_mono, AudioCapture, AudioChunk, StreamHandle, VadDetector,
    TARGET_RATE,
};
use crate::capture::Transcript;
use crate::config::RecognitionConfig;
use crate::error::VoiceErrorKind;
use crate::language::LocaleTag;
use crate::platform::{RecognitionEvent, RecognitionSettings, RecognitionSink, Recognizer};

use super::engine::{fit_audio, SttEngine, MAX_AUDIO_SAMPLES};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STALL_TIMEOUT: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// ListenParams
// ---------------------------------------------------------------------------

/// Timing and detection parameters for one listening attempt.
#[derive(Debug, Clone)]
pub struct ListenParams {
    pub interim_results: bool,
    pub continuous: bool,
    pub interim_interval: Duration,
    pub silence_timeout: Duration,
    pub no_speech_timeout: Duration,
    pub max_duration: Duration,
    pub vad_threshold: f32,
}

impl ListenParams {
    pub fn new(config: &RecognitionConfig, settings: &RecognitionSettings) -> Self {
        Self {
            interim_results: settings.interim_results,
            continuous: settings.continuous,
            interim_interval: Duration::from_millis(config.interim_interval_ms),
            silence_timeout: Duration::from_millis(config.silence_timeout_ms),
            no_speech_timeout: Duration::from_millis(config.no_speech_timeout_ms),
            max_duration: Duration::from_secs(config.max_listen_secs),
            vad_threshold: config.vad_threshold,
        }
    }
}

impl Default for ListenParams {
    fn default() -> Self {
        Self::new(&RecognitionConfig::default(), &RecognitionSettings::default())
    }
}

fn samples_for(duration: Duration) -> usize {
    (duration.as_secs_f64() * TARGET_RATE as f64) as usize
}

// ---------------------------------------------------------------------------
// WhisperRecognizer
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ListenControl {
    aborted: AtomicBool,
}

struct ActiveListen {
    control: Arc<ListenControl>,
    /// Dropping the stream closes the chunk channel, which the worker reads
    /// as "finish now".
    stream: Option<StreamHandle>,
    _worker: JoinHandle<()>,
}

pub struct WhisperRecognizer {
    locale: LocaleTag,
    engine: Arc<dyn SttEngine>,
    params: ListenParams,
    active: Option<ActiveListen>,
}

impl WhisperRecognizer {
    pub fn new(locale: LocaleTag, engine: Arc<dyn SttEngine>, params: ListenParams) -> Self {
        Self {
            locale,
            engine,
            params,
            active: None,
        }
    }
}

impl Recognizer for WhisperRecognizer {
    fn locale(&self) -> &LocaleTag {
        &self.locale
    }

    fn start(&mut self, sink: RecognitionSink) -> Result<(), VoiceErrorKind> {
        self.abort();

        let capture = AudioCapture::new().map_err(|e| {
            log::warn!("cannot open microphone: {e}");
            e.kind()
        })?;
        let (tx, rx) = mpsc::channel();
        let stream = capture.start(tx).map_err(|e| {
            log::warn!("cannot start microphone stream: {e}");
            e.kind()
        })?;
        log::debug!(
            "microphone open: {} Hz, {} channel(s)",
            capture.sample_rate(),
            capture.channels()
        );

        let control = Arc::new(ListenControl::default());
        let worker = {
            let control = Arc::clone(&control);
            let engine = Arc::clone(&self.engine);
            let params = self.params.clone();
            let language = self.locale.primary_language();
            std::thread::Builder::new()
                .name("whisper-listen".into())
                .spawn(move || listen(rx, engine.as_ref(), language, &params, &control, &sink))
                .map_err(|e| {
                    log::warn!("cannot spawn listener thread: {e}");
                    VoiceErrorKind::Unknown
                })?
        };

        self.active = Some(ActiveListen {
            control,
            stream: Some(stream),
            _worker: worker,
        });
        Ok(())
    }

    fn finish(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.stream.take();
        }
    }

    fn abort(&mut self) {
        if let Some(active) = self.active.take() {
            active.control.aborted.store(true, Ordering::SeqCst);
            // The worker is detached; a transcription in progress finishes
            // in the background and its events are discarded.
        }
    }
}

impl Drop for WhisperRecognizer {
    fn drop(&mut self) {
        self.abort();
    }
}

// ---------------------------------------------------------------------------
// Listener loop
// ---------------------------------------------------------------------------

enum Outcome {
    Finalize,
    NoSpeech,
    Stalled,
    Aborted,
}

struct Phrase {
    audio: Vec<f32>,
    heard_speech: bool,
    /// Samples captured since the last voiced chunk.
    silent_samples: usize,
    /// Buffer length at the last interim transcription.
    interim_mark: usize,
    last_interim: String,
}

impl Phrase {
    fn new() -> Self {
        Self {
            audio: Vec::new(),
            heard_speech: false,
            silent_samples: 0,
            interim_mark: 0,
            last_interim: String::new(),
        }
    }
}

fn listen(
    chunks: Receiver<AudioChunk>,
    engine: &dyn SttEngine,
    language: &str,
    params: &ListenParams,
    control: &ListenControl,
    sink: &RecognitionSink,
) {
    let vad = VadDetector::new(params.vad_threshold);
    let silence_limit = samples_for(params.silence_timeout);
    let no_speech_limit = samples_for(params.no_speech_timeout);
    let max_samples = samples_for(params.max_duration).min(MAX_AUDIO_SAMPLES);
    let interim_step = samples_for(params.interim_interval).max(1);

    let mut current = Phrase::new();
    let mut total_samples = 0usize;
    let mut last_chunk = Instant::now();

    let outcome = loop {
        if control.aborted.load(Ordering::SeqCst) {
            break Outcome::Aborted;
        }

        let chunk = match chunks.recv_timeout(POLL_INTERVAL) {
            Ok(chunk) => chunk,
            Err(RecvTimeoutError::Timeout) => {
                if last_chunk.elapsed() >= STALL_TIMEOUT {
                    break Outcome::Stalled;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break Outcome::Finalize,
        };
        last_chunk = Instant::now();

        let mono = stereo_to_mono(&chunk.samples, chunk.channels);
        let samples = resample_to_16k(&mono, chunk.sample_rate);
        total_samples += samples.len();

        if vad.contains_voice(&samples) {
            current.heard_speech = true;
            current.silent_samples = 0;
        } else {
            current.silent_samples += samples.len();
        }
        current.audio.extend_from_slice(&samples);

        if !current.heard_speech {
            if total_samples >= no_speech_limit {
                break Outcome::NoSpeech;
            }
            // Keep only a short lead-in while waiting for speech.
            if current.audio.len() > interim_step {
                let excess = current.audio.len() - interim_step;
                current.audio.drain(..excess);
            }
            continue;
        }

        if current.audio.len() >= max_samples {
            break Outcome::Finalize;
        }

        if !params.continuous && current.silent_samples >= silence_limit {
            break Outcome::Finalize;
        }

        if params.interim_results && current.audio.len() - current.interim_mark >= interim_step {
            current.interim_mark = current.audio.len();
            emit_interim(&mut current, engine, language, control, sink);
        }
    };

    match outcome {
        Outcome::Aborted => {}
        Outcome::Finalize if current.heard_speech => {
            emit_final(&current, engine, language, &vad, control, sink);
        }
        Outcome::Finalize | Outcome::NoSpeech => {
            sink.emit(RecognitionEvent::Error(VoiceErrorKind::NoSpeechDetected));
        }
        Outcome::Stalled => {
            log::warn!("microphone stopped delivering audio");
            sink.emit(RecognitionEvent::Error(VoiceErrorKind::AudioCapture));
        }
    }
    sink.emit(RecognitionEvent::End);
}

fn emit_interim(
    current: &mut Phrase,
    engine: &dyn SttEngine,
    language: &str,
    control: &ListenControl,
    sink: &RecognitionSink,
) {
    match engine.transcribe(&fit_audio(&current.audio), language) {
        Ok(text) if !text.is_empty() && text != current.last_interim => {
            if !control.aborted.load(Ordering::SeqCst) {
                sink.emit(RecognitionEvent::Result(Transcript::interim(text.clone())));
            }
            current.last_interim = text;
        }
        Ok(_) => {}
        Err(e) => log::debug!("interim transcription skipped: {e}"),
    }
}

/// Transcribe the whole attempt.  Nothing is emitted when the attempt was
/// aborted meanwhile.
fn emit_final(
    finished: &Phrase,
    engine: &dyn SttEngine,
    language: &str,
    vad: &VadDetector,
    control: &ListenControl,
    sink: &RecognitionSink,
) {
    let speech = vad.trim_silence(&finished.audio);
    let event = if speech.is_empty() {
        RecognitionEvent::Error(VoiceErrorKind::NoSpeechDetected)
    } else {
        match engine.transcribe(&fit_audio(speech), language) {
            Ok(text) if text.trim().is_empty() => {
                RecognitionEvent::Error(VoiceErrorKind::NoSpeechDetected)
            }
            Ok(text) => RecognitionEvent::Result(Transcript::final_text(text)),
            Err(e) => {
                log::warn!("transcription failed: {e}");
                RecognitionEvent::Error(e.kind())
            }
        }
    };

    if !control.aborted.load(Ordering::SeqCst) {
        sink.emit(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{EventSink, Stamped};
    use crate::stt::engine::{MockSttEngine, SttError};
    use tokio::sync::mpsc::unbounded_channel;

    fn chunk(level: f32, samples: usize) -> AudioChunk {
        AudioChunk {
            samples: vec![level; samples],
            sample_rate: TARGET_RATE,
            channels: 1,
        }
    }

    fn params() -> ListenParams {
        ListenParams {
            interim_results: false,
            ..ListenParams::default()
        }
    }

    /// Feed `chunks` to the listener, close the channel and collect events.
    fn run(
        chunks: Vec<AudioChunk>,
        engine: &dyn SttEngine,
        params: &ListenParams,
        control: &ListenControl,
    ) -> Vec<RecognitionEvent> {
        let (tx, rx) = mpsc::channel();
        for c in chunks {
            tx.send(c).unwrap();
        }
        drop(tx);

        let (etx, mut erx) = unbounded_channel::<Stamped<RecognitionEvent>>();
        let sink = EventSink::new(1, etx);
        listen(rx, engine, "hi", params, control, &sink);
        drop(sink);

        let mut events = Vec::new();
        while let Ok(stamped) = erx.try_recv() {
            events.push(stamped.event);
        }
        events
    }

    #[test]
    fn speech_then_finish_yields_final_then_end() {
        let engine = MockSttEngine::ok("मुझे बुखार है");
        let events = run(
            vec![chunk(0.0, 1_600), chunk(0.5, 16_000), chunk(0.0, 1_600)],
            &engine,
            &params(),
            &ListenControl::default(),
        );
        assert_eq!(
            events,
            vec![
                RecognitionEvent::Result(Transcript::final_text("मुझे बुखार है")),
                RecognitionEvent::End,
            ]
        );
        assert_eq!(engine.languages(), vec!["hi".to_string()]);
    }

    #[test]
    fn silence_only_reports_no_speech() {
        let engine = MockSttEngine::ok("ghost");
        let events = run(
            vec![chunk(0.0, 16_000)],
            &engine,
            &params(),
            &ListenControl::default(),
        );
        assert_eq!(
            events,
            vec![
                RecognitionEvent::Error(VoiceErrorKind::NoSpeechDetected),
                RecognitionEvent::End,
            ]
        );
        assert!(engine.languages().is_empty());
    }

    #[test]
    fn no_speech_timeout_ends_without_closing_the_channel() {
        let engine = MockSttEngine::ok("ghost");
        let p = ListenParams {
            no_speech_timeout: Duration::from_millis(500),
            ..params()
        };
        let (tx, rx) = mpsc::channel();
        tx.send(chunk(0.0, 16_000)).unwrap();

        let (etx, mut erx) = unbounded_channel();
        let sink = EventSink::new(1, etx);
        listen(rx, &engine, "en", &p, &ListenControl::default(), &sink);
        drop(tx);

        assert_eq!(
            erx.try_recv().unwrap().event,
            RecognitionEvent::Error(VoiceErrorKind::NoSpeechDetected)
        );
        assert_eq!(erx.try_recv().unwrap().event, RecognitionEvent::End);
    }

    #[test]
    fn trailing_silence_finalises_single_shot() {
        let engine = MockSttEngine::ok("hello");
        let p = ListenParams {
            silence_timeout: Duration::from_millis(500),
            ..params()
        };
        let (tx, rx) = mpsc::channel();
        tx.send(chunk(0.5, 16_000)).unwrap();
        tx.send(chunk(0.0, 16_000)).unwrap();

        let (etx, mut erx) = unbounded_channel();
        let sink = EventSink::new(1, etx);
        // Returns although the sender is still alive.
        listen(rx, &engine, "en", &p, &ListenControl::default(), &sink);
        drop(tx);

        assert_eq!(
            erx.try_recv().unwrap().event,
            RecognitionEvent::Result(Transcript::final_text("hello"))
        );
        assert_eq!(erx.try_recv().unwrap().event, RecognitionEvent::End);
    }

    #[test]
    fn continuous_mode_listens_through_pauses() {
        let engine = MockSttEngine::ok("fever since monday");
        let p = ListenParams {
            continuous: true,
            silence_timeout: Duration::from_millis(500),
            ..params()
        };
        let events = run(
            vec![chunk(0.5, 16_000), chunk(0.0, 32_000), chunk(0.5, 16_000)],
            &engine,
            &p,
            &ListenControl::default(),
        );
        assert_eq!(
            events,
            vec![
                RecognitionEvent::Result(Transcript::final_text("fever since monday")),
                RecognitionEvent::End,
            ]
        );
        assert_eq!(engine.languages().len(), 1);
    }

    #[test]
    fn single_shot_mode_ends_at_the_first_pause() {
        let engine = MockSttEngine::ok("fever");
        let p = ListenParams {
            silence_timeout: Duration::from_millis(500),
            ..params()
        };
        let (tx, rx) = mpsc::channel();
        tx.send(chunk(0.5, 16_000)).unwrap();
        tx.send(chunk(0.0, 32_000)).unwrap();
        tx.send(chunk(0.5, 16_000)).unwrap();

        let (etx, mut erx) = unbounded_channel();
        let sink = EventSink::new(1, etx);
        listen(rx, &engine, "en", &p, &ListenControl::default(), &sink);

        assert_eq!(
            erx.try_recv().unwrap().event,
            RecognitionEvent::Result(Transcript::final_text("fever"))
        );
        assert_eq!(erx.try_recv().unwrap().event, RecognitionEvent::End);
        assert!(erx.try_recv().is_err());
        drop(tx);
    }

    #[test]
    fn blank_transcription_is_no_speech() {
        let engine = MockSttEngine::ok("   ");
        let events = run(
            vec![chunk(0.5, 16_000)],
            &engine,
            &params(),
            &ListenControl::default(),
        );
        assert_eq!(
            events[0],
            RecognitionEvent::Error(VoiceErrorKind::NoSpeechDetected)
        );
    }

    #[test]
    fn engine_failure_is_reported_as_error() {
        let engine = MockSttEngine::err(SttError::Transcription("boom".into()));
        let events = run(
            vec![chunk(0.5, 16_000)],
            &engine,
            &params(),
            &ListenControl::default(),
        );
        assert_eq!(
            events,
            vec![
                RecognitionEvent::Error(VoiceErrorKind::Unknown),
                RecognitionEvent::End,
            ]
        );
    }

    #[test]
    fn interim_results_precede_the_final() {
        let engine = MockSttEngine::ok("partial");
        let p = ListenParams {
            interim_results: true,
            interim_interval: Duration::from_millis(500),
            ..ListenParams::default()
        };
        let events = run(
            vec![chunk(0.5, 8_000), chunk(0.5, 8_000)],
            &engine,
            &p,
            &ListenControl::default(),
        );
        assert_eq!(
            events,
            vec![
                RecognitionEvent::Result(Transcript::interim("partial")),
                RecognitionEvent::Result(Transcript::final_text("partial")),
                RecognitionEvent::End,
            ]
        );
    }

    #[test]
    fn aborted_attempt_emits_only_end() {
        let engine = MockSttEngine::ok("never");
        let control = ListenControl::default();
        control.aborted.store(true, Ordering::SeqCst);
        let events = run(vec![chunk(0.5, 16_000)], &engine, &params(), &control);
        assert_eq!(events, vec![RecognitionEvent::End]);
    }

    #[test]
    fn stereo_48k_input_is_converted() {
        let engine = MockSttEngine::ok("ok");
        let stereo = AudioChunk {
            samples: vec![0.5; 96_000],
            sample_rate: 48_000,
            channels: 2,
        };
        let events = run(vec![stereo], &engine, &params(), &ListenControl::default());
        assert_eq!(events[0], RecognitionEvent::Result(Transcript::final_text("ok")));
    }

    #[test]
    fn listen_params_follow_config() {
        let mut config = RecognitionConfig::default();
        config.silence_timeout_ms = 900;
        let settings = RecognitionSettings {
            interim_results: false,
            continuous: true,
        };
        let p = ListenParams::new(&config, &settings);
        assert_eq!(p.silence_timeout, Duration::from_millis(900));
        assert!(p.continuous);
        assert!(!p.interim_results);
    }
}

//! [`Synthesizer`] that speaks through an external command-line engine
//! (espeak-ng by default).
//!
//! Each utterance spawns one `tokio::process` child that plays the audio
//! itself.  The text goes in on stdin, never on the command line.
//! Cancelling drops the utterance's cancel handle; the watcher task then
//! kills the child and reports nothing further.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::error::VoiceErrorKind;
use crate::language::LocaleTag;
use crate::platform::{SynthesisEvent, SynthesisSink, Synthesizer, Utterance};

/// Longest text accepted for a single utterance (64 KiB).
const MAX_TEXT_BYTES: usize = 64 * 1024;

/// Upper bound on how long one utterance may keep the engine busy.
const SPEAK_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("text of {0} bytes exceeds the {} byte limit", MAX_TEXT_BYTES)]
    TextTooLong(usize),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl TtsError {
    pub fn kind(&self) -> VoiceErrorKind {
        VoiceErrorKind::SynthesisFailure
    }
}

pub struct CommandSynthesizer {
    program: PathBuf,
    args: Vec<String>,
    runtime: Handle,
    /// Dropping this ends the utterance currently playing.
    cancel: Option<oneshot::Sender<()>>,
}

impl CommandSynthesizer {
    /// `args` are placed before the generated voice/rate/pitch/volume flags.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, runtime: Handle) -> Self {
        Self {
            program: program.into(),
            args,
            runtime,
            cancel: None,
        }
    }

    fn launch(&self, utterance: &Utterance) -> Result<Child, TtsError> {
        if utterance.text.len() > MAX_TEXT_BYTES {
            return Err(TtsError::TextTooLong(utterance.text.len()));
        }
        let _guard = self.runtime.enter();
        Command::new(&self.program)
            .args(&self.args)
            .args(engine_args(utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TtsError::Spawn {
                program: self.program.display().to_string(),
                source,
            })
    }
}

impl Synthesizer for CommandSynthesizer {
    fn speak(&mut self, utterance: Utterance, sink: SynthesisSink) -> Result<(), VoiceErrorKind> {
        self.cancel_all();

        let mut child = self.launch(&utterance).map_err(|e| {
            log::warn!("{e}");
            e.kind()
        })?;

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        self.cancel = Some(cancel_tx);

        let program = self.program.display().to_string();
        let text = utterance.text;
        self.runtime.spawn(async move {
            sink.emit(SynthesisEvent::Started);

            if let Some(mut stdin) = child.stdin.take() {
                // An engine that exits early closes the pipe; the exit
                // status below tells whether that was a failure.
                if let Err(e) = stdin.write_all(text.as_bytes()).await {
                    log::debug!("{program}: writing text failed: {e}");
                }
            }

            tokio::select! {
                status = tokio::time::timeout(SPEAK_TIMEOUT, child.wait()) => {
                    let event = match status {
                        Ok(Ok(status)) if status.success() => SynthesisEvent::Ended,
                        Ok(Ok(status)) => {
                            log::warn!("{program} exited with {status}");
                            SynthesisEvent::Error(VoiceErrorKind::SynthesisFailure)
                        }
                        Ok(Err(e)) => {
                            log::warn!("waiting for {program} failed: {e}");
                            SynthesisEvent::Error(VoiceErrorKind::SynthesisFailure)
                        }
                        Err(_) => {
                            log::warn!("{program} timed out after {}s", SPEAK_TIMEOUT.as_secs());
                            let _ = child.kill().await;
                            SynthesisEvent::Error(VoiceErrorKind::SynthesisFailure)
                        }
                    };
                    sink.emit(event);
                }
                _ = cancel_rx => {
                    if let Err(e) = child.kill().await {
                        log::debug!("{program}: kill after cancel failed: {e}");
                    }
                }
            }
        });
        Ok(())
    }

    fn cancel_all(&mut self) {
        self.cancel.take();
    }
}

impl Drop for CommandSynthesizer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

// ---------------------------------------------------------------------------
// Argument mapping
// ---------------------------------------------------------------------------

/// espeak-ng voice name for `locale`: regional English variants keep their
/// region, every other language uses its bare code.
pub fn voice_for(locale: &LocaleTag) -> String {
    match (locale.primary_language(), locale.region()) {
        ("en", Some(region)) => format!("en-{}", region.to_ascii_lowercase()),
        (lang, _) => lang.to_string(),
    }
}

/// espeak-ng flags for `utterance`.  Multipliers are applied to the engine
/// defaults: 175 words per minute, pitch 50, amplitude 100.
pub fn engine_args(utterance: &Utterance) -> Vec<String> {
    let wpm = (175.0 * utterance.rate).round().clamp(80.0, 450.0) as u32;
    let pitch = (50.0 * utterance.pitch).round().clamp(0.0, 99.0) as u32;
    let amplitude = (100.0 * utterance.volume).round().clamp(0.0, 200.0) as u32;
    vec![
        "-v".into(),
        voice_for(&utterance.locale),
        "-s".into(),
        wpm.to_string(),
        "-p".into(),
        pitch.to_string(),
        "-a".into(),
        amplitude.to_string(),
        "--stdin".into(),
    ]
}

/// `true` when `program` is an existing file, or a bare name found on `PATH`.
pub fn program_available(program: &Path) -> bool {
    if program.components().count() > 1 || program.is_absolute() {
        return program.is_file();
    }
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| {
        let candidate = dir.join(program);
        candidate.is_file() || (cfg!(windows) && candidate.with_extension("exe").is_file())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{resolve, LanguageTag};
    use crate::platform::{EventSink, Stamped};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn utterance(lang: &str, text: &str) -> Utterance {
        Utterance {
            text: text.into(),
            locale: resolve(&LanguageTag::new(lang)),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }

    #[test]
    fn voices_follow_locale() {
        assert_eq!(voice_for(&resolve(&LanguageTag::new("en"))), "en-us");
        assert_eq!(voice_for(&resolve(&LanguageTag::new("hi"))), "hi");
        assert_eq!(voice_for(&resolve(&LanguageTag::new("ta"))), "ta");
        assert_eq!(voice_for(&resolve(&LanguageTag::new("xx"))), "en-us");
    }

    #[test]
    fn args_scale_engine_defaults() {
        let args = engine_args(&utterance("hi", "x"));
        assert_eq!(
            args,
            ["-v", "hi", "-s", "175", "-p", "50", "-a", "100", "--stdin"]
        );
    }

    #[test]
    fn args_are_clamped() {
        let mut u = utterance("en", "x");
        u.rate = 10.0;
        u.pitch = 5.0;
        u.volume = 0.0;
        let args = engine_args(&u);
        assert_eq!(args[3], "450");
        assert_eq!(args[5], "99");
        assert_eq!(args[7], "0");
    }

    #[test]
    fn missing_program_is_unavailable() {
        assert!(!program_available(Path::new("definitely-not-a-speech-engine-42")));
        assert!(!program_available(Path::new("/nonexistent/espeak-ng")));
    }

    #[cfg(unix)]
    #[test]
    fn shell_is_found_on_path() {
        assert!(program_available(Path::new("sh")));
    }

    #[cfg(unix)]
    fn shell_synth(script: &str) -> CommandSynthesizer {
        CommandSynthesizer::new(
            "sh",
            vec!["-c".into(), script.into(), "sh".into()],
            Handle::current(),
        )
    }

    async fn next(rx: &mut UnboundedReceiver<Stamped<SynthesisEvent>>) -> Option<SynthesisEvent> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .ok()
            .flatten()
            .map(|s| s.event)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_run_reports_started_then_ended() {
        let mut synth = shell_synth("cat > /dev/null");
        let (tx, mut rx) = unbounded_channel();
        synth
            .speak(utterance("hi", "नमस्ते"), EventSink::new(1, tx))
            .unwrap();

        assert_eq!(next(&mut rx).await, Some(SynthesisEvent::Started));
        assert_eq!(next(&mut rx).await, Some(SynthesisEvent::Ended));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_engine_reports_synthesis_failure() {
        let mut synth = shell_synth("exit 3");
        let (tx, mut rx) = unbounded_channel();
        synth.speak(utterance("en", "hello"), EventSink::new(1, tx)).unwrap();

        assert_eq!(next(&mut rx).await, Some(SynthesisEvent::Started));
        assert_eq!(
            next(&mut rx).await,
            Some(SynthesisEvent::Error(VoiceErrorKind::SynthesisFailure))
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancel_kills_without_further_events() {
        let mut synth = shell_synth("sleep 30");
        let (tx, mut rx) = unbounded_channel();
        synth.speak(utterance("en", "hello"), EventSink::new(1, tx)).unwrap();
        assert_eq!(next(&mut rx).await, Some(SynthesisEvent::Started));

        synth.cancel_all();
        drop(synth);
        // The watcher task drops the last sink clone once the child is gone.
        assert_eq!(next(&mut rx).await, None);
    }

    #[tokio::test]
    async fn missing_program_fails_to_speak() {
        let mut synth = CommandSynthesizer::new(
            "/nonexistent/espeak-ng",
            Vec::new(),
            Handle::current(),
        );
        let (tx, _rx) = unbounded_channel();
        assert_eq!(
            synth.speak(utterance("en", "hello"), EventSink::new(1, tx)),
            Err(VoiceErrorKind::SynthesisFailure)
        );
    }

    #[test]
    fn tts_errors_are_synthesis_failures() {
        assert_eq!(
            TtsError::TextTooLong(1).kind(),
            VoiceErrorKind::SynthesisFailure
        );
        assert!(TtsError::TextTooLong(70_000).to_string().contains("70000"));
    }

    #[tokio::test]
    async fn oversized_text_is_rejected() {
        let mut synth = CommandSynthesizer::new("sh", Vec::new(), Handle::current());
        let (tx, _rx) = unbounded_channel();
        let text = "a".repeat(MAX_TEXT_BYTES + 1);
        assert_eq!(
            synth.speak(utterance("en", &text), EventSink::new(1, tx)),
            Err(VoiceErrorKind::SynthesisFailure)
        );
    }
}

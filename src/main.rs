//! Console front end for civic-voice.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime.
//! 4. Probe the [`NativePlatform`] on a blocking thread (this loads the
//!    speech model) and build one [`VoiceSurface`].
//! 5. Read commands from stdin; pump voice events every 100 ms.
//!
//! Commands: `listen`, `done`, `stop`, `say <text>`, `hush`, `lang <tag>`,
//! `status`, `help`, `quit`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use civic_voice::{
    capture::{CaptureCallbacks, CaptureEvent},
    config::AppConfig,
    language::LanguageTag,
    messages::{error_message, listening_prompt, retry_hint, unsupported_notice, you_said_label},
    platform::NativePlatform,
    playback::PlaybackEvent,
    VoiceSurface,
};

const PUMP_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Command parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Listen,
    Done,
    Stop,
    Say(String),
    Hush,
    Lang(LanguageTag),
    Status,
    Help,
    Quit,
}

impl Command {
    /// `None` for blank input.  Anything unrecognised is spoken as text.
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match word.to_ascii_lowercase().as_str() {
            "listen" => Self::Listen,
            "done" => Self::Done,
            "stop" => Self::Stop,
            "say" => Self::Say(rest.to_string()),
            "hush" => Self::Hush,
            "lang" if !rest.is_empty() => Self::Lang(LanguageTag::new(rest)),
            "status" => Self::Status,
            "help" | "?" | "lang" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Say(line.to_string()),
        };
        Some(command)
    }
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

struct Console {
    surface: VoiceSurface,
    config: AppConfig,
}

impl Console {
    fn new(platform: NativePlatform, config: AppConfig) -> Self {
        let platform = Arc::new(platform);
        let callbacks = CaptureCallbacks::default().on_interim(|text| println!("  … {text}"));
        let surface = VoiceSurface::new(
            platform,
            config.language.clone(),
            config.recognition.settings(),
            config.playback.settings(),
            callbacks,
        );
        Self { surface, config }
    }

    fn greet(&self) {
        let caps = self.surface.capabilities();
        log::info!(
            "language {} ({}), recognition: {}, synthesis: {}",
            self.surface.language(),
            self.surface.capture().locale(),
            caps.recognition,
            caps.synthesis
        );
        if !caps.recognition {
            println!("{}", unsupported_notice(self.surface.language()));
        }
        println!("Type `help` for commands.");
    }

    /// Returns `false` when the user asked to quit.
    fn handle(&mut self, command: Command) -> bool {
        let lang = self.surface.language().clone();
        match command {
            Command::Listen => {
                if !self.surface.capture().is_supported() {
                    println!("{}", unsupported_notice(&lang));
                    return true;
                }
                self.surface.playback_mut().stop();
                self.surface.capture_mut().start();
                if self.surface.capture().is_listening() {
                    println!("{}", listening_prompt(&lang));
                }
                self.pump();
            }
            Command::Done => self.surface.capture_mut().finish(),
            Command::Stop => self.surface.capture_mut().stop(),
            Command::Say(text) => {
                if !self.surface.playback().is_supported() {
                    println!("{text}");
                    return true;
                }
                self.surface.playback_mut().speak(&text);
            }
            Command::Hush => self.surface.playback_mut().stop(),
            Command::Lang(tag) => {
                if !tag.is_known() {
                    log::warn!("no locale for '{tag}'; English voices will be used");
                }
                self.surface.set_language(tag.clone());
                self.config.language = tag;
                if let Err(e) = self.config.save() {
                    log::warn!("failed to save settings: {e:#}");
                }
                println!(
                    "language: {} ({})",
                    self.surface.language(),
                    self.surface.capture().locale()
                );
            }
            Command::Status => self.print_status(),
            Command::Help => print_help(),
            Command::Quit => return false,
        }
        true
    }

    fn print_status(&self) {
        let caps = self.surface.capabilities();
        let capture = self.surface.capture();
        println!("language:    {} ({})", self.surface.language(), capture.locale());
        println!(
            "recognition: {} [{}]",
            if caps.recognition { "available" } else { "unavailable" },
            capture.state().label()
        );
        println!(
            "synthesis:   {} [{:?}]",
            if caps.synthesis { "available" } else { "unavailable" },
            self.surface.playback().state()
        );
        if let Some(kind) = capture.last_error() {
            println!("last error:  {kind}");
        }
    }

    /// Apply pending events from both components.
    fn pump(&mut self) {
        let lang = self.surface.language().clone();

        for event in self.surface.capture_mut().pump() {
            match event {
                CaptureEvent::Interim(_) => {}
                CaptureEvent::Final(transcript) => {
                    println!("{} {}", you_said_label(&lang), transcript.text);
                    let echo = format!("{} {}", you_said_label(&lang), transcript.text);
                    self.surface.playback_mut().speak(&echo);
                }
                CaptureEvent::Error(kind) => {
                    println!("{}", error_message(kind, &lang));
                    if let Some(hint) = retry_hint(kind, &lang) {
                        println!("{hint}");
                    }
                }
            }
        }

        for event in self.surface.playback_mut().pump() {
            if let PlaybackEvent::Failed(kind) = event {
                println!("{}", error_message(kind, &lang));
            }
        }
    }
}

fn print_help() {
    println!("listen        start voice input");
    println!("done          stop listening and use what was heard");
    println!("stop          cancel voice input");
    println!("say <text>    read text aloud");
    println!("hush          stop reading aloud");
    println!("lang <tag>    switch language (en, hi, bn, ta, te, mr)");
    println!("status        show voice status");
    println!("quit          exit");
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let probe_config = config.clone();
    let platform = tokio::task::spawn_blocking(move || NativePlatform::from_config(&probe_config))
        .await
        .context("voice platform probe panicked")?;
    let mut console = Console::new(platform, config);
    console.greet();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(PUMP_INTERVAL);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if let Some(command) = Command::parse(&line) {
                    if !console.handle(command) {
                        break;
                    }
                }
            }
            _ = ticker.tick() => console.pump(),
        }
    }

    log::info!("shutting down");
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("civic-voice starting up");

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("listen"), Some(Command::Listen));
        assert_eq!(Command::parse("  DONE "), Some(Command::Done));
        assert_eq!(
            Command::parse("say drink water"),
            Some(Command::Say("drink water".into()))
        );
        assert_eq!(
            Command::parse("lang ta"),
            Some(Command::Lang(LanguageTag::new("ta")))
        );
        assert_eq!(Command::parse("exit"), Some(Command::Quit));
    }

    #[test]
    fn blank_input_is_ignored() {
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn lang_without_tag_shows_help() {
        assert_eq!(Command::parse("lang"), Some(Command::Help));
    }

    #[test]
    fn free_text_is_spoken() {
        assert_eq!(
            Command::parse("where is the clinic"),
            Some(Command::Say("where is the clinic".into()))
        );
    }
}

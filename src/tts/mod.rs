//! Text-to-speech backends.
//!
//! The only native backend drives an external engine binary (espeak-ng by
//! default) that plays audio on the default output device by itself.

pub mod command;

pub use command::{engine_args, program_available, voice_for, CommandSynthesizer, TtsError};

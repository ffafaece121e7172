//! Voice failure taxonomy shared by capture and playback.
//!
//! Capability absence is reported through `is_supported()` on each
//! component; every other failure reaches the caller as a [`VoiceErrorKind`]
//! through the component's event path, never as a returned error.

use thiserror::Error;

/// Why a listening attempt or an utterance failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum VoiceErrorKind {
    /// The platform has no speech capability of the requested kind.
    #[error("speech capability is not available")]
    Unsupported,

    /// The user or the OS refused microphone access.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The attempt ended without any recognisable speech.
    #[error("no speech detected")]
    NoSpeechDetected,

    /// A remote recognition service could not be reached.
    #[error("network failure during recognition")]
    NetworkFailure,

    /// The attempt was cancelled by an explicit stop or a superseding start.
    #[error("recognition aborted")]
    Aborted,

    /// The microphone could not be opened or stopped delivering audio.
    #[error("audio capture failed")]
    AudioCapture,

    /// The engine has no support for the requested locale.
    #[error("language not supported by the speech engine")]
    LanguageNotSupported,

    /// Text-to-speech failed (missing voice, engine crash, …).
    #[error("speech synthesis failed")]
    SynthesisFailure,

    /// Anything the platform reported that does not fit the kinds above.
    #[error("unknown speech failure")]
    Unknown,
}

impl VoiceErrorKind {
    /// Map a platform error code (`"not-allowed"`, `"no-speech"`, …) to a kind.
    ///
    /// ```
    /// use civic_voice::error::VoiceErrorKind;
    ///
    /// assert_eq!(VoiceErrorKind::from_platform_code("not-allowed"), VoiceErrorKind::PermissionDenied);
    /// assert_eq!(VoiceErrorKind::from_platform_code("bogus"), VoiceErrorKind::Unknown);
    /// ```
    pub fn from_platform_code(code: &str) -> Self {
        match code.trim() {
            "not-allowed" | "service-not-allowed" | "permission-denied" => Self::PermissionDenied,
            "no-speech" => Self::NoSpeechDetected,
            "network" => Self::NetworkFailure,
            "aborted" | "canceled" | "interrupted" => Self::Aborted,
            "audio-capture" => Self::AudioCapture,
            "language-not-supported" | "language-unavailable" | "voice-unavailable" => {
                Self::LanguageNotSupported
            }
            "synthesis-failed" | "synthesis-unavailable" | "audio-busy" | "audio-hardware" => {
                Self::SynthesisFailure
            }
            "unsupported" => Self::Unsupported,
            _ => Self::Unknown,
        }
    }

    /// Stable short identifier, the inverse of [`from_platform_code`](Self::from_platform_code)
    /// for the canonical codes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unsupported => "unsupported",
            Self::PermissionDenied => "not-allowed",
            Self::NoSpeechDetected => "no-speech",
            Self::NetworkFailure => "network",
            Self::Aborted => "aborted",
            Self::AudioCapture => "audio-capture",
            Self::LanguageNotSupported => "language-not-supported",
            Self::SynthesisFailure => "synthesis-failed",
            Self::Unknown => "unknown",
        }
    }

    /// `true` when pressing the microphone button again is a reasonable
    /// remedy.  Permission and capability problems need a different action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoSpeechDetected
                | Self::NetworkFailure
                | Self::Aborted
                | Self::AudioCapture
                | Self::Unknown
        )
    }
}

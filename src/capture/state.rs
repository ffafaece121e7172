//! Capture state machine types.
//!
//! ```text
//! Idle ──start()──▶ Listening ──final result──▶ Idle   (on_final fired)
//!                       │  └──error──────────▶ Idle   (on_error fired)
//!                       │  └──stop()─────────▶ Idle   (nothing fired)
//!                       └──finish()──▶ Finalizing ──final / error / end──▶ Idle
//! ```
//!
//! `Error` is transient: the session sits in it only while the error
//! callback runs and then settles in `Idle`.

/// Listening state of a [`SpeechCaptureSession`](super::SpeechCaptureSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Listening,
    /// The user asked to finish; waiting for the engine's final result.
    Finalizing,
    Error,
}

impl CaptureState {
    /// `true` while a listening attempt is in progress.
    ///
    /// ```
    /// use civic_voice::capture::CaptureState;
    ///
    /// assert!(CaptureState::Listening.is_active());
    /// assert!(CaptureState::Finalizing.is_active());
    /// assert!(!CaptureState::Idle.is_active());
    /// assert!(!CaptureState::Error.is_active());
    /// ```
    pub fn is_active(&self) -> bool {
        matches!(self, CaptureState::Listening | CaptureState::Finalizing)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "Idle",
            CaptureState::Listening => "Listening",
            CaptureState::Finalizing => "Finalizing",
            CaptureState::Error => "Error",
        }
    }
}

/// Recognised speech text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub is_final: bool,
}

impl Transcript {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// What a caller observes from a capture session.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// Live feedback; superseded by later interims and by the final result.
    Interim(Transcript),
    /// The authoritative transcript.  Ends the listening attempt.
    Final(Transcript),
    /// The attempt failed.  Ends the listening attempt.
    Error(crate::error::VoiceErrorKind),
}

impl CaptureEvent {
    /// `true` for events that end a listening attempt.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CaptureEvent::Interim(_))
    }
}

//! User-facing text for voice failures and prompts.
//!
//! Messages exist in English and Hindi; any other [`LanguageTag`] falls back
//! to English.  Each [`VoiceErrorKind`] maps to its own message because the
//! remedy differs (grant permission vs. speak again vs. type instead).

use crate::error::VoiceErrorKind;
use crate::language::LanguageTag;

fn is_hindi(lang: &LanguageTag) -> bool {
    lang.as_str() == "hi"
}

/// Actionable message for `kind` in `lang`.
///
/// ```
/// use civic_voice::error::VoiceErrorKind;
/// use civic_voice::language::LanguageTag;
/// use civic_voice::messages::error_message;
///
/// let msg = error_message(VoiceErrorKind::NoSpeechDetected, &LanguageTag::new("en"));
/// assert!(msg.contains("speak again"));
/// ```
pub fn error_message(kind: VoiceErrorKind, lang: &LanguageTag) -> &'static str {
    if is_hindi(lang) {
        hindi(kind)
    } else {
        english(kind)
    }
}

fn english(kind: VoiceErrorKind) -> &'static str {
    match kind {
        VoiceErrorKind::Unsupported => {
            "Voice is not available on this device. Please type instead."
        }
        VoiceErrorKind::PermissionDenied => {
            "Microphone access is blocked. Please allow microphone permission and try again."
        }
        VoiceErrorKind::NoSpeechDetected => {
            "We could not hear you. Please press the microphone and speak again."
        }
        VoiceErrorKind::NetworkFailure => {
            "Voice recognition needs an internet connection. Check your connection and try again."
        }
        VoiceErrorKind::Aborted => "Listening was stopped. Press the microphone to start again.",
        VoiceErrorKind::AudioCapture => {
            "No working microphone was found. Check that it is connected and try again."
        }
        VoiceErrorKind::LanguageNotSupported => {
            "Voice is not available for this language yet. Please type or choose another language."
        }
        VoiceErrorKind::SynthesisFailure => {
            "The message could not be read aloud. You can still read it on screen."
        }
        VoiceErrorKind::Unknown => GENERIC_EN,
    }
}

fn hindi(kind: VoiceErrorKind) -> &'static str {
    match kind {
        VoiceErrorKind::Unsupported => {
            "इस डिवाइस पर आवाज़ उपलब्ध नहीं है। कृपया टाइप करें।"
        }
        VoiceErrorKind::PermissionDenied => {
            "माइक्रोफ़ोन की अनुमति नहीं है। कृपया माइक्रोफ़ोन की अनुमति दें और फिर से कोशिश करें।"
        }
        VoiceErrorKind::NoSpeechDetected => {
            "हम आपकी आवाज़ नहीं सुन पाए। कृपया माइक दबाकर फिर से बोलें।"
        }
        VoiceErrorKind::NetworkFailure => {
            "आवाज़ पहचान के लिए इंटरनेट चाहिए। कनेक्शन जाँचें और फिर से कोशिश करें।"
        }
        VoiceErrorKind::Aborted => "सुनना बंद कर दिया गया। फिर से शुरू करने के लिए माइक दबाएँ।",
        VoiceErrorKind::AudioCapture => {
            "कोई चालू माइक्रोफ़ोन नहीं मिला। जाँचें कि वह जुड़ा है और फिर से कोशिश करें।"
        }
        VoiceErrorKind::LanguageNotSupported => {
            "इस भाषा में अभी आवाज़ उपलब्ध नहीं है। कृपया टाइप करें या दूसरी भाषा चुनें।"
        }
        VoiceErrorKind::SynthesisFailure => {
            "संदेश बोलकर नहीं सुनाया जा सका। आप इसे स्क्रीन पर पढ़ सकते हैं।"
        }
        VoiceErrorKind::Unknown => GENERIC_HI,
    }
}

const GENERIC_EN: &str = "Something went wrong. Please try again.";
const GENERIC_HI: &str = "कुछ गलत हो गया। कृपया फिर से कोशिश करें।";

/// Fallback text shown when voice input is not available at all.
pub fn unsupported_notice(lang: &LanguageTag) -> &'static str {
    error_message(VoiceErrorKind::Unsupported, lang)
}

/// Prompt shown while the microphone is open.
pub fn listening_prompt(lang: &LanguageTag) -> &'static str {
    if is_hindi(lang) {
        "सुन रहे हैं… साफ़ बोलें"
    } else {
        "Listening… speak clearly"
    }
}

/// Console follow-up for a capture error: how to try again, or `None` when
/// retrying will not help (permission, capability or language problems).
pub fn retry_hint(kind: VoiceErrorKind, lang: &LanguageTag) -> Option<&'static str> {
    if !kind.is_retryable() {
        return None;
    }
    Some(if is_hindi(lang) {
        "फिर से कोशिश करने के लिए `listen` लिखें।"
    } else {
        "Type `listen` to try again."
    })
}

/// Prefix for the live "you said …" echo.
pub fn you_said_label(lang: &LanguageTag) -> &'static str {
    if is_hindi(lang) {
        "आपने कहा:"
    } else {
        "You said:"
    }
}

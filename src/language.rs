//! Application language tags and their platform locale mapping.
//!
//! [`LanguageTag`] is the short code the rest of the application stores and
//! passes around (`"hi"`, `"en"`, …).  Speech engines want a full locale
//! (`"hi-IN"`), which is what [`LocaleTag`] carries.  [`resolve`] is the only
//! place that conversion happens, so recognition and synthesis always agree
//! on the locale for a given language.
//!
//! ```
//! use civic_voice::language::{resolve, LanguageTag};
//!
//! assert_eq!(resolve(&LanguageTag::new("hi")).as_str(), "hi-IN");
//! assert_eq!(resolve(&LanguageTag::new("xx")).as_str(), "en-US");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Locale table
// ---------------------------------------------------------------------------

/// Locale used for any language tag missing from [`LOCALE_TABLE`].
pub const DEFAULT_LOCALE: &str = "en-US";

/// Fixed application-language → platform-locale mapping.
pub const LOCALE_TABLE: &[(&str, &str)] = &[
    ("en", "en-US"),
    ("hi", "hi-IN"),
    ("bn", "bn-IN"),
    ("ta", "ta-IN"),
    ("te", "te-IN"),
    ("mr", "mr-IN"),
];

// ---------------------------------------------------------------------------
// LanguageTag
// ---------------------------------------------------------------------------

/// Application-level language identifier.
///
/// Stored lower-cased and trimmed; any string is accepted so an unknown
/// language coming from persisted settings never fails to load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_ascii_lowercase())
    }

    pub fn english() -> Self {
        Self::new("en")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when the tag has an explicit entry in [`LOCALE_TABLE`].
    pub fn is_known(&self) -> bool {
        LOCALE_TABLE.iter().any(|(tag, _)| *tag == self.0)
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for LanguageTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// LocaleTag
// ---------------------------------------------------------------------------

/// Platform-level locale identifier such as `"hi-IN"`.  Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleTag(&'static str);

impl LocaleTag {
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// The language subtag (`"hi"` for `"hi-IN"`).
    pub fn primary_language(&self) -> &'static str {
        self.0.split('-').next().unwrap_or(self.0)
    }

    /// The region subtag (`"IN"` for `"hi-IN"`), if any.
    pub fn region(&self) -> Option<&'static str> {
        self.0.split('-').nth(1)
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

/// Map `tag` to its platform locale.  Total: unmapped tags yield
/// [`DEFAULT_LOCALE`].
pub fn resolve(tag: &LanguageTag) -> LocaleTag {
    let locale = LOCALE_TABLE
        .iter()
        .find(|(lang, _)| *lang == tag.as_str())
        .map(|(_, locale)| *locale)
        .unwrap_or(DEFAULT_LOCALE);
    LocaleTag(locale)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

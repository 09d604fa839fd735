use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the service accepts for skills, jobs and narratives.
///
/// English is the canonical working language: every text is translated to
/// it before being embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LanguageTag {
    #[default]
    En,
    Hi,
    Bn,
    Mr,
    Te,
    Ta,
    Gu,
    Ur,
    Kn,
    Or,
    Ml,
}

impl LanguageTag {
    pub const CANONICAL: LanguageTag = LanguageTag::En;

    pub const ALL: [LanguageTag; 11] = [
        LanguageTag::En,
        LanguageTag::Hi,
        LanguageTag::Bn,
        LanguageTag::Mr,
        LanguageTag::Te,
        LanguageTag::Ta,
        LanguageTag::Gu,
        LanguageTag::Ur,
        LanguageTag::Kn,
        LanguageTag::Or,
        LanguageTag::Ml,
    ];

    /// ISO 639-1 code
    pub fn code(self) -> &'static str {
        match self {
            LanguageTag::En => "en",
            LanguageTag::Hi => "hi",
            LanguageTag::Bn => "bn",
            LanguageTag::Mr => "mr",
            LanguageTag::Te => "te",
            LanguageTag::Ta => "ta",
            LanguageTag::Gu => "gu",
            LanguageTag::Ur => "ur",
            LanguageTag::Kn => "kn",
            LanguageTag::Or => "or",
            LanguageTag::Ml => "ml",
        }
    }

    #[inline]
    pub fn is_canonical(self) -> bool {
        self == Self::CANONICAL
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LanguageTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_lowercase();
        LanguageTag::ALL
            .into_iter()
            .find(|tag| tag.code() == code)
            .ok_or_else(|| Error::UnsupportedLanguage(s.to_string()))
    }
}

impl TryFrom<String> for LanguageTag {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<LanguageTag> for String {
    fn from(tag: LanguageTag) -> Self {
        tag.code().to_string()
    }
}

/// Source side of a translation: a known language or auto-detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    Auto,
    Tag(LanguageTag),
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLanguage::Auto => f.write_str("auto"),
            SourceLanguage::Tag(tag) => write!(f, "{}", tag),
        }
    }
}

impl From<LanguageTag> for SourceLanguage {
    fn from(tag: LanguageTag) -> Self {
        SourceLanguage::Tag(tag)
    }
}

//! Locale resolution for multi-locale text fields.
//!
//! Specs carry one string per supported locale; the store keeps a single
//! string chosen by the configured default locale. Resolution happens here,
//! before any comparison, so the diffing code only ever sees plain strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A supported locale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Ja,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ja => "ja",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ja" => Ok(Self::Ja),
            other => Err(format!("unknown locale: {other}")),
        }
    }
}

/// One string per locale.
///
/// `en` is mandatory in practice; `ja` may be left empty, in which case the
/// English variant is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub ja: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, ja: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ja: ja.into(),
        }
    }

    /// Same text for every locale.
    pub fn uniform(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            en: text.clone(),
            ja: text,
        }
    }
}

/// Pick the variant for `locale`, falling back to English when it is empty.
pub fn resolve(text: &LocalizedText, locale: Locale) -> &str {
    match locale {
        Locale::Ja if !text.ja.is_empty() => &text.ja,
        _ => &text.en,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_requested_locale() {
        let text = LocalizedText::new("Hello", "こんにちは");
        assert_eq!(resolve(&text, Locale::En), "Hello");
        assert_eq!(resolve(&text, Locale::Ja), "こんにちは");
    }

    #[test]
    fn empty_japanese_falls_back_to_english() {
        let text = LocalizedText::new("Hello", "");
        assert_eq!(resolve(&text, Locale::Ja), "Hello");
    }

    #[test]
    fn parses_locale_case_insensitively() {
        assert_eq!("JA".parse::<Locale>(), Ok(Locale::Ja));
        assert!("fr".parse::<Locale>().is_err());
    }
}

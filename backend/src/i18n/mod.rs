//! Interface text in English, Arabic, Urdu and Persian.
//!
//! English is the source language: [`translate`] looks the English text up
//! and falls back to it when no translation exists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TITLE: &str = "Advanced Data Sweeper";
pub const TAGLINE: &str =
    "Transform your files between CSV and Excel formats with built-in data cleaning and visualization.";
pub const UPLOAD_PROMPT: &str = "Upload your files (CSV or Excel):";

/// English text with its Arabic, Urdu and Persian translations.
const TRANSLATIONS: &[(&str, &str, &str, &str)] = &[
    (
        TITLE,
        "ماسح البيانات المتقدم",
        "جدید ڈیٹا سویپر",
        "جاروبرقی داده پیشرفته",
    ),
    (
        TAGLINE,
        "قم بتحويل ملفاتك بين تنسيقات CSV و Excel مع تنظيف البيانات المدمج والتصور.",
        "CSV اور Excel فارمیٹس میں اپنی فائلوں کو تبدیل کریں، اندرونی ڈیٹا صفائی اور تصویری نمائندگی کے ساتھ۔",
        "تبدیل فایل‌های شما بین فرمت‌های CSV و Excel با پاکسازی داده و نمایش داده‌های داخلی.",
    ),
    (
        UPLOAD_PROMPT,
        "تحميل ملفاتك (CSV أو Excel):",
        "اپنی فائلیں اپ لوڈ کریں (CSV یا Excel):",
        "بارگذاری فایل‌های خود (CSV یا Excel):",
    ),
];

/// Supported interface languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "ur")]
    Urdu,
    #[serde(rename = "fa")]
    Persian,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::Arabic,
        Language::Urdu,
        Language::Persian,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Arabic => "ar",
            Language::Urdu => "ur",
            Language::Persian => "fa",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Arabic => "Arabic",
            Language::Urdu => "Urdu",
            Language::Persian => "Persian",
        }
    }

    /// Arabic, Urdu and Persian are written right to left.
    pub fn is_rtl(&self) -> bool {
        !matches!(self, Language::English)
    }
}

impl FromStr for Language {
    type Err = String;

    /// Accepts a code (`fa`) or an English name (`Persian`), case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.code() == wanted || l.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown language: {} (expected en, ar, ur or fa)", s))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Translate English interface text; unknown text is returned unchanged.
pub fn translate(text: &str, language: Language) -> &str {
    let Some(&(_, ar, ur, fa)) = TRANSLATIONS.iter().find(|(en, ..)| *en == text) else {
        return text;
    };
    match language {
        Language::English => text,
        Language::Arabic => ar,
        Language::Urdu => ur,
        Language::Persian => fa,
    }
}

/// All interface strings in one language, keyed for the web page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiStrings {
    pub language: Language,
    pub rtl: bool,
    pub title: &'static str,
    pub tagline: &'static str,
    pub upload_prompt: &'static str,
}

pub fn ui_strings(language: Language) -> UiStrings {
    UiStrings {
        language,
        rtl: language.is_rtl(),
        title: translate(TITLE, language),
        tagline: translate(TAGLINE, language),
        upload_prompt: translate(UPLOAD_PROMPT, language),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language() {
        assert_eq!("fa".parse::<Language>().unwrap(), Language::Persian);
        assert_eq!("Urdu".parse::<Language>().unwrap(), Language::Urdu);
        assert_eq!(" AR ".parse::<Language>().unwrap(), Language::Arabic);
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn test_translate() {
        assert_eq!(translate(TITLE, Language::English), TITLE);
        assert_eq!(translate(TITLE, Language::Arabic), "ماسح البيانات المتقدم");
        assert_ne!(translate(UPLOAD_PROMPT, Language::Urdu), UPLOAD_PROMPT);
    }

    #[test]
    fn test_untranslated_text_falls_back_to_english() {
        assert_eq!(translate("Download", Language::Persian), "Download");
    }

    #[test]
    fn test_every_language_translates_every_string() {
        for language in Language::ALL {
            let strings = ui_strings(language);
            assert!(!strings.title.is_empty());
            assert_eq!(strings.rtl, language != Language::English);
        }
    }

    #[test]
    fn test_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Language::Persian).unwrap(), "\"fa\"");
    }
}

use crate::config::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `(key, text)` pair read from a CSV data row.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceEntry {
    pub key: String,
    pub text: String,
}

impl SourceEntry {
    pub fn new<K: Into<String>, T: Into<String>>(key: K, text: T) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// A CSV row together with all of its translations.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationRecord {
    pub key: String,
    pub source_text: String,
    translated: BTreeMap<Language, String>,
}

impl TranslationRecord {
    pub fn new(entry: SourceEntry) -> Self {
        Self {
            key: entry.key,
            source_text: entry.text,
            translated: BTreeMap::new(),
        }
    }

    /// Attaches the text for a target language. The source language is
    /// always the CSV text and cannot be overridden.
    pub fn with_translation(mut self, lang: Language, text: String) -> Self {
        if !lang.is_source() {
            self.translated.insert(lang, text);
        }
        self
    }

    /// Text for `lang`; a language that was not translated yields the source text.
    pub fn text(&self, lang: Language) -> &str {
        self.translated
            .get(&lang)
            .map(String::as_str)
            .unwrap_or(&self.source_text)
    }

    pub fn has_translation(&self, lang: Language) -> bool {
        lang.is_source() || self.translated.contains_key(&lang)
    }
}

//! Word-index tokenizer compatible with documents written by Keras'
//! `Tokenizer.to_json()`.
//!
//! The vocabulary is built offline; this module only reads it and maps text
//! to index sequences, reproducing the out-of-vocabulary handling of the
//! tokenizer that produced the document.

use crate::error::DeserializationError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Top-level `{"class_name": "Tokenizer", "config": {...}}` document
#[derive(Debug, Deserialize)]
struct TokenizerDocument {
    #[serde(default)]
    class_name: Option<String>,
    config: TokenizerSettings,
}

#[derive(Debug, Deserialize)]
struct TokenizerSettings {
    #[serde(default)]
    num_words: Option<usize>,
    #[serde(default = "default_filters")]
    filters: String,
    #[serde(default = "default_true")]
    lower: bool,
    #[serde(default = "default_split")]
    split: String,
    #[serde(default)]
    char_level: bool,
    #[serde(default)]
    oov_token: Option<String>,
    /// Either an object or, as Keras writes it, a JSON-encoded string
    word_index: Value,
}

fn default_filters() -> String {
    DEFAULT_FILTERS.to_string()
}

fn default_true() -> bool {
    true
}

fn default_split() -> String {
    " ".to_string()
}

/// Text-to-index-sequence mapper
#[derive(Debug, Clone)]
pub struct KerasTokenizer {
    word_index: HashMap<String, i64>,
    num_words: Option<usize>,
    filters: Vec<char>,
    lower: bool,
    split: String,
    char_level: bool,
    oov_index: Option<i64>,
}

impl KerasTokenizer {
    /// Load a tokenizer document from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DeserializationError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading tokenizer");

        let raw = std::fs::read_to_string(path).map_err(|source| DeserializationError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let tokenizer = Self::from_json(&raw).map_err(|reason| DeserializationError::Tokenizer {
            path: path.to_path_buf(),
            reason,
        })?;

        info!(
            vocab_size = tokenizer.vocab_size(),
            oov = tokenizer.oov_index.is_some(),
            "Tokenizer loaded successfully"
        );
        Ok(tokenizer)
    }

    /// Parse a tokenizer document
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let doc: TokenizerDocument = serde_json::from_str(raw).map_err(|e| e.to_string())?;

        if let Some(class_name) = &doc.class_name {
            if class_name != "Tokenizer" {
                return Err(format!("expected class_name \"Tokenizer\", got {class_name:?}"));
            }
        }

        let settings = doc.config;
        let word_index: HashMap<String, i64> = match settings.word_index {
            Value::String(encoded) => serde_json::from_str(&encoded)
                .map_err(|e| format!("word_index is not a valid JSON object: {e}"))?,
            other @ Value::Object(_) => serde_json::from_value(other)
                .map_err(|e| format!("word_index is not a word -> index map: {e}"))?,
            _ => return Err("word_index must be an object".to_string()),
        };

        if settings.split.is_empty() && !settings.char_level {
            return Err("split separator must not be empty".to_string());
        }

        let oov_index = settings
            .oov_token
            .as_ref()
            .and_then(|token| word_index.get(token).copied());

        Ok(Self {
            word_index,
            num_words: settings.num_words,
            filters: settings.filters.chars().collect(),
            lower: settings.lower,
            split: settings.split,
            char_level: settings.char_level,
            oov_index,
        })
    }

    /// Number of entries in the word index
    pub fn vocab_size(&self) -> usize {
        self.word_index.len()
    }

    /// Map one text to its index sequence
    pub fn text_to_sequence(&self, text: &str) -> Vec<i64> {
        self.words(text)
            .iter()
            .filter_map(|word| self.lookup(word))
            .collect()
    }

    /// Map each text to its index sequence
    pub fn texts_to_sequences<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Vec<i64>> {
        texts
            .iter()
            .map(|text| self.text_to_sequence(text.as_ref()))
            .collect()
    }

    /// Split text into the tokens looked up in the word index
    fn words(&self, text: &str) -> Vec<String> {
        let text = if self.lower {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        if self.char_level {
            return text.chars().map(String::from).collect();
        }

        let mut cleaned = String::with_capacity(text.len());
        for c in text.chars() {
            if self.filters.contains(&c) {
                cleaned.push_str(&self.split);
            } else {
                cleaned.push(c);
            }
        }

        cleaned
            .split(self.split.as_str())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Index for a word, applying the vocabulary limit and OOV policy
    fn lookup(&self, word: &str) -> Option<i64> {
        match self.word_index.get(word) {
            Some(&index) => match self.num_words {
                // A limit of 0 means no limit
                Some(limit) if limit > 0 && index >= limit as i64 => self.oov_index,
                _ => Some(index),
            },
            None => self.oov_index,
        }
    }
}

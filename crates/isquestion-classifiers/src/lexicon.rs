//! Word lists driving the heuristic guard
//!
//! Lists are plain configuration: a YAML mapping from category to strings.
//! A default lexicon is compiled in and can be replaced at startup.

use std::collections::HashSet;
use std::path::Path;

use isquestion_core::{Error, Result};
use serde::{Deserialize, Serialize};

const BUILTIN_LEXICON: &str = include_str!("../lexicon.yaml");

/// Guard word lists; every entry is stored lower-cased and trimmed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lexicon {
    /// Tokens that mark a question anywhere in the sentence
    #[serde(default)]
    pub question_words: HashSet<String>,

    /// Tokens that mark a question when they start the sentence
    #[serde(default)]
    pub question_starters: HashSet<String>,

    /// Punctuation padded with spaces before tokenizing
    #[serde(default)]
    pub pad_chars: Vec<String>,

    /// Tokens exempt from the profanity check
    #[serde(default)]
    pub whitelist: HashSet<String>,

    /// Tokens that reject a sentence
    #[serde(default)]
    pub profanity: HashSet<String>,
}

impl Lexicon {
    /// The compiled-in default lexicon
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_LEXICON)
    }

    /// Parse a lexicon from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let lexicon: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid lexicon: {}", e)))?;
        Ok(lexicon.normalized())
    }

    /// Load a lexicon from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read lexicon {}: {}", path.display(), e)))?;
        let lexicon = Self::from_yaml(&content)?;
        tracing::info!(
            path = %path.display(),
            profanity = lexicon.profanity.len(),
            whitelist = lexicon.whitelist.len(),
            "Loaded lexicon"
        );
        Ok(lexicon)
    }

    /// True when `token` is profane and not whitelisted.
    ///
    /// `token` must already be lower-cased.
    pub fn is_profane(&self, token: &str) -> bool {
        !self.whitelist.contains(token) && self.profanity.contains(token)
    }

    pub fn is_question_word(&self, token: &str) -> bool {
        self.question_words.contains(token)
    }

    pub fn is_question_starter(&self, token: &str) -> bool {
        self.question_starters.contains(token)
    }

    fn normalized(self) -> Self {
        fn clean(set: HashSet<String>) -> HashSet<String> {
            set.into_iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        }

        Self {
            question_words: clean(self.question_words),
            question_starters: clean(self.question_starters),
            pad_chars: self
                .pad_chars
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .collect(),
            whitelist: clean(self.whitelist),
            profanity: clean(self.profanity),
        }
    }
}

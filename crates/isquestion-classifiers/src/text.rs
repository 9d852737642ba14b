//! Sentence normalization shared by the guard and the feature pipeline

use aho_corasick::{AhoCorasick, MatchKind};
use isquestion_core::{Error, Result};

/// Pads configured punctuation with spaces so it tokenizes on its own.
///
/// `"is it ok?"` becomes `"is it ok ? "`, which lets `?` be matched as a
/// standalone token after whitespace splitting.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    matcher: Option<AhoCorasick>,
    replacements: Vec<String>,
}

impl Sanitizer {
    /// Build a sanitizer for the given punctuation strings
    pub fn new<I, S>(pad_chars: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = pad_chars
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if patterns.is_empty() {
            return Ok(Self {
                matcher: None,
                replacements: Vec::new(),
            });
        }

        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| Error::config(format!("Failed to build punctuation matcher: {}", e)))?;

        let replacements = patterns.iter().map(|p| format!(" {} ", p)).collect();

        Ok(Self {
            matcher: Some(matcher),
            replacements,
        })
    }

    /// Surround every configured punctuation occurrence with spaces
    pub fn sanitize(&self, text: &str) -> String {
        match &self.matcher {
            Some(matcher) => matcher.replace_all(text, self.replacements.as_slice()),
            None => text.to_string(),
        }
    }

    /// Lower-case, then sanitize
    pub fn normalize(&self, text: &str) -> String {
        self.sanitize(&text.to_lowercase())
    }
}

/// Whitespace tokens of a sentence
pub fn whitespace_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// Word tokens used by the vectorizer: lower-cased runs of two or more
/// word characters (letters, digits, underscore). Single characters and
/// punctuation never become features.
pub fn word_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().nth(1).is_some())
        .map(str::to_string)
        .collect()
}

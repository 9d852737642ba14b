//! Heuristic guard around the statistical classifier
//!
//! Three screens run before the model sees a sentence, in this order:
//! degenerate input, language, profanity. Any of them short-circuits the
//! request to a `false` answer. After the model runs, a lexical override can
//! turn a negative prediction into a question.

use std::sync::Arc;

use isquestion_core::{OverrideRule, RejectReason};
use serde::{Deserialize, Serialize};

use crate::language::LanguageDetector;
use crate::lexicon::Lexicon;
use crate::text::whitespace_tokens;

/// Guard thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Sentences with fewer characters are rejected
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,

    /// Sentences with fewer whitespace tokens skip statistical language
    /// detection and only need a Latin script
    #[serde(default = "default_min_detection_tokens")]
    pub min_detection_tokens: usize,
}

fn default_min_chars() -> usize {
    5
}

fn default_min_detection_tokens() -> usize {
    4
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
            min_detection_tokens: default_min_detection_tokens(),
        }
    }
}

/// Rule layer applied before and after classification
#[derive(Clone)]
pub struct HeuristicGuard {
    config: GuardConfig,
    lexicon: Arc<Lexicon>,
    detector: Arc<dyn LanguageDetector>,
}

impl std::fmt::Debug for HeuristicGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeuristicGuard")
            .field("config", &self.config)
            .field("detector", &self.detector.name())
            .finish()
    }
}

impl HeuristicGuard {
    pub fn new(config: GuardConfig, lexicon: Arc<Lexicon>, detector: Arc<dyn LanguageDetector>) -> Self {
        Self {
            config,
            lexicon,
            detector,
        }
    }

    /// Run every pre-classification screen, returning the first rejection
    pub fn screen(&self, sentence: &str) -> Option<RejectReason> {
        self.check_degenerate(sentence)
            .or_else(|| self.check_language(sentence))
            .or_else(|| self.check_profanity(sentence))
    }

    /// Too short, or one character repeated
    pub fn check_degenerate(&self, sentence: &str) -> Option<RejectReason> {
        let chars = sentence.chars().count();
        if chars < self.config.min_chars {
            return Some(RejectReason::TooShort {
                chars,
                min_chars: self.config.min_chars,
            });
        }

        let mut iter = sentence.chars();
        if let Some(first) = iter.next() {
            if iter.all(|c| c == first) {
                return Some(RejectReason::RepeatedCharacter);
            }
        }
        None
    }

    /// Reject anything that is not English.
    ///
    /// Short inputs give the detector too little signal, so they pass on
    /// script alone. Longer inputs are rejected only on a reliable
    /// non-English detection; a low-confidence guess falls back to the
    /// script rule.
    pub fn check_language(&self, sentence: &str) -> Option<RejectReason> {
        let tokens = whitespace_tokens(sentence).count();
        if tokens >= self.config.min_detection_tokens {
            match self.detector.detect(sentence) {
                Some(detection) if detection.is_english() => return None,
                Some(detection) if detection.reliable => {
                    tracing::debug!(
                        language = %detection.code,
                        confidence = detection.confidence,
                        "Rejected non-English sentence"
                    );
                    return Some(RejectReason::NotEnglish {
                        detected: Some(detection.code),
                    });
                }
                Some(detection) => {
                    tracing::trace!(
                        language = %detection.code,
                        confidence = detection.confidence,
                        "Unreliable language guess, checking script"
                    );
                }
                None => return Some(RejectReason::NotEnglish { detected: None }),
            }
        }

        if self.detector.is_latin_script(sentence) {
            None
        } else {
            Some(RejectReason::NotEnglish { detected: None })
        }
    }

    /// First profane, non-whitelisted whitespace token, case-insensitive.
    ///
    /// A token matches as written or with surrounding punctuation trimmed,
    /// so `"fuck?"` is caught while `"neo-nazi"` stays one token.
    pub fn check_profanity(&self, sentence: &str) -> Option<RejectReason> {
        let lowered = sentence.to_lowercase();
        let found = whitespace_tokens(&lowered)
            .find_map(|token| {
                let trimmed = token.trim_matches(|c: char| c.is_ascii_punctuation());
                [token, trimmed]
                    .into_iter()
                    .find(|candidate| self.lexicon.is_profane(candidate))
            })
            .map(|token| RejectReason::Profanity {
                token: token.to_string(),
            });
        found
    }

    /// Lexical rule for a normalized sentence the model called negative
    pub fn override_rule(&self, normalized: &str) -> Option<OverrideRule> {
        let mut tokens = whitespace_tokens(normalized);
        let first = tokens.next()?;
        if self.lexicon.is_question_starter(first) {
            return Some(OverrideRule::QuestionStarter(first.to_string()));
        }

        std::iter::once(first)
            .chain(tokens)
            .find(|token| self.lexicon.is_question_word(token))
            .map(|token| OverrideRule::QuestionWord(token.to_string()))
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }
}

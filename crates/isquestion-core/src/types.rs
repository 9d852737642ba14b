//! Core types for isquestion

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary label produced by a classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Class 0
    NotQuestion,
    /// Class 1
    Question,
}

impl Label {
    /// Build a label from a 0/1 class index
    pub fn from_class(class: u8) -> Self {
        if class == 0 {
            Self::NotQuestion
        } else {
            Self::Question
        }
    }

    /// Label for a decision score; positive means question
    pub fn from_score(score: f64) -> Self {
        if score > 0.0 {
            Self::Question
        } else {
            Self::NotQuestion
        }
    }

    /// The 0/1 class index of this label
    pub fn class(self) -> u8 {
        match self {
            Self::NotQuestion => 0,
            Self::Question => 1,
        }
    }

    pub fn is_question(self) -> bool {
        self == Self::Question
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotQuestion => f.write_str("not_question"),
            Self::Question => f.write_str("question"),
        }
    }
}

/// Why the guard refused to classify a sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// Fewer characters than the configured minimum
    TooShort { chars: usize, min_chars: usize },

    /// The whole sentence is a single repeated character
    RepeatedCharacter,

    /// The dominant language is not English
    NotEnglish { detected: Option<String> },

    /// A non-whitelisted profane token was found
    Profanity { token: String },
}

impl RejectReason {
    /// Short stable name, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "too_short",
            Self::RepeatedCharacter => "repeated_character",
            Self::NotEnglish { .. } => "not_english",
            Self::Profanity { .. } => "profanity",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { chars, min_chars } => {
                write!(f, "sentence has {chars} characters, minimum is {min_chars}")
            }
            Self::RepeatedCharacter => f.write_str("sentence is a single repeated character"),
            Self::NotEnglish { detected: Some(lang) } => {
                write!(f, "sentence language is {lang}, not English")
            }
            Self::NotEnglish { detected: None } => f.write_str("sentence language is unknown"),
            Self::Profanity { token } => write!(f, "sentence contains profane token '{token}'"),
        }
    }
}

/// Lexical rule that turned a negative prediction into a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "token", rename_all = "snake_case")]
pub enum OverrideRule {
    /// First token is a question starter ("does", "can", ...)
    QuestionStarter(String),
    /// Some token is a question word ("who", "how", "?", ...)
    QuestionWord(String),
}

/// Outcome of running the statistical model plus the override rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Final answer after the override rule
    pub is_question: bool,

    /// Raw classifier label
    pub model_label: Label,

    /// Classifier decision function (positive means question)
    pub score: f64,

    /// Set when the override rule flipped a negative prediction
    pub overridden_by: Option<OverrideRule>,
}

/// Result of evaluating one sentence
///
/// Callers can tell "classified false" apart from "failed to classify"
/// without looking at error strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verdict {
    /// The guard rejected the input; the answer is `false`
    Rejected(RejectReason),

    /// The classifier ran to completion
    Classified(Classification),

    /// Feature extraction or classification failed
    Failed { reason: String },
}

impl Verdict {
    /// The boolean answer, or `None` when classification failed
    pub fn is_question(&self) -> Option<bool> {
        match self {
            Self::Rejected(_) => Some(false),
            Self::Classified(classification) => Some(classification.is_question),
            Self::Failed { .. } => None,
        }
    }

    /// Short stable name, used as a metrics label
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Classified(c) if c.is_question => "question",
            Self::Classified(_) => "not_question",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

//! isquestion Classifiers
//!
//! Decides whether a short piece of English text is a question.
//!
//! Two layers cooperate:
//! - A heuristic guard: degenerate-input rejection, language check,
//!   profanity screening, and a lexical override for negative predictions
//! - A statistical model: TF-IDF features reduced by truncated SVD and
//!   scored by a gradient-boosted tree ensemble
//!
//! The fitting code for every model component lives here too, so the
//! trainer and the service share one implementation.

pub mod artifact;
pub mod bundle;
pub mod classifier;
pub mod gbdt;
pub mod guard;
pub mod language;
pub mod lexicon;
mod linalg;
pub mod pipeline;
pub mod svd;
pub mod text;
pub mod tfidf;
pub mod tree;

pub use artifact::{ArtifactKind, FORMAT_VERSION};
pub use bundle::ModelBundle;
pub use classifier::Classifier;
pub use gbdt::{GbdtParams, GradientBoostingClassifier};
pub use guard::{GuardConfig, HeuristicGuard};
pub use language::{Detection, LanguageDetector, StaticDetector, WhatlangDetector};
pub use lexicon::Lexicon;
pub use pipeline::QuestionPipeline;
pub use svd::{SvdConfig, TruncatedSvd};
pub use text::Sanitizer;
pub use tfidf::{SparseVector, TfIdfConfig, TfIdfVectorizer};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bundle::ModelBundle;
    pub use crate::classifier::Classifier;
    pub use crate::guard::{GuardConfig, HeuristicGuard};
    pub use crate::language::{LanguageDetector, StaticDetector, WhatlangDetector};
    pub use crate::lexicon::Lexicon;
    pub use crate::pipeline::QuestionPipeline;
}

//! End-to-end question classification
//!
//! Guard screens, then sanitize, vectorize, reduce and classify, then the
//! override rule. The pipeline holds only immutable state and can be shared
//! across threads behind an `Arc`.

use std::sync::Arc;

use isquestion_core::{Classification, Result, Verdict};

use crate::bundle::ModelBundle;
use crate::guard::{GuardConfig, HeuristicGuard};
use crate::language::LanguageDetector;
use crate::lexicon::Lexicon;
use crate::text::Sanitizer;

/// Guard plus model bundle
#[derive(Debug, Clone)]
pub struct QuestionPipeline {
    guard: HeuristicGuard,
    sanitizer: Sanitizer,
    bundle: ModelBundle,
}

impl QuestionPipeline {
    pub fn new(guard: HeuristicGuard, sanitizer: Sanitizer, bundle: ModelBundle) -> Self {
        Self {
            guard,
            sanitizer,
            bundle,
        }
    }

    /// Build a pipeline whose sanitizer pads the lexicon's punctuation
    pub fn from_parts(
        config: GuardConfig,
        lexicon: Lexicon,
        detector: Arc<dyn LanguageDetector>,
        bundle: ModelBundle,
    ) -> Result<Self> {
        let sanitizer = Sanitizer::new(&lexicon.pad_chars)?;
        let guard = HeuristicGuard::new(config, Arc::new(lexicon), detector);
        Ok(Self::new(guard, sanitizer, bundle))
    }

    /// Evaluate one sentence.
    ///
    /// Never fails: processing errors come back as `Verdict::Failed`.
    pub fn evaluate(&self, sentence: &str) -> Verdict {
        if let Some(reason) = self.guard.screen(sentence) {
            tracing::debug!(reason = reason.kind(), "Sentence rejected by guard");
            return Verdict::Rejected(reason);
        }

        match self.classify(sentence) {
            Ok(classification) => Verdict::Classified(classification),
            Err(e) => {
                tracing::warn!(error = %e, "Classification failed");
                Verdict::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Run the model and the override rule, skipping the guard screens
    pub fn classify(&self, sentence: &str) -> Result<Classification> {
        let normalized = self.sanitizer.normalize(sentence);
        let (model_label, score) = self.bundle.classify(&normalized)?;

        let overridden_by = if model_label.is_question() {
            None
        } else {
            self.guard.override_rule(&normalized)
        };

        if let Some(rule) = &overridden_by {
            tracing::trace!(rule = ?rule, score, "Override flipped negative prediction");
        }

        Ok(Classification {
            is_question: model_label.is_question() || overridden_by.is_some(),
            model_label,
            score,
            overridden_by,
        })
    }

    pub fn guard(&self) -> &HeuristicGuard {
        &self.guard
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }
}

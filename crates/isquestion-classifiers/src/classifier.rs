//! Classifier trait and common types

use isquestion_core::{Label, Result};

/// Binary classifier over dense feature vectors.
///
/// Anything that maps a fixed-width vector to a question / not-question
/// label can back the pipeline; the gradient-boosted model is the default.
pub trait Classifier: Send + Sync {
    /// Signed confidence; positive means question
    fn decision_function(&self, features: &[f64]) -> Result<f64>;

    /// Expected input width
    fn n_features(&self) -> usize;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Predict a label from the decision function
    fn predict(&self, features: &[f64]) -> Result<Label> {
        Ok(Label::from_score(self.decision_function(features)?))
    }
}

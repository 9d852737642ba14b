//! Gradient-boosted decision trees for binary classification
//!
//! Boosting minimizes binomial deviance. The ensemble starts from the
//! log-odds of the training prior; every stage fits a regression tree to the
//! residuals `y - p` and sets each leaf to one Newton step,
//! `sum(r) / sum(p * (1 - p))`.

use std::time::Instant;

use isquestion_core::{Error, Label, Result};
use serde::{Deserialize, Serialize};

use crate::classifier::Classifier;
use crate::tree::{RegressionTree, TreeParams};

/// Boosting hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GbdtParams {
    /// Number of boosting stages
    pub n_estimators: usize,
    /// Shrinkage applied to every stage
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples required in each leaf
    pub min_samples_leaf: usize,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl GbdtParams {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }
}

/// Fitted gradient-boosted classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    params: GbdtParams,
    n_features: usize,
    init_score: f64,
    trees: Vec<RegressionTree>,
    /// Mean binomial deviance on the training data after each stage
    #[serde(default)]
    train_loss: Vec<f64>,
}

impl GradientBoostingClassifier {
    /// Fit the ensemble on dense rows and their labels
    pub fn fit(features: &[Vec<f64>], labels: &[Label], params: &GbdtParams) -> Result<Self> {
        if features.is_empty() {
            return Err(Error::classifier("cannot fit classifier on zero samples"));
        }
        if features.len() != labels.len() {
            return Err(Error::dimension_mismatch(
                "classifier labels",
                features.len(),
                labels.len(),
            ));
        }
        if params.n_estimators == 0 || params.learning_rate <= 0.0 {
            return Err(Error::config(
                "n_estimators and learning_rate must be positive",
            ));
        }

        let n_features = features[0].len();
        if let Some(row) = features.iter().find(|row| row.len() != n_features) {
            return Err(Error::dimension_mismatch("classifier fit", n_features, row.len()));
        }

        let y: Vec<f64> = labels.iter().map(|l| f64::from(l.class())).collect();
        let positives = y.iter().sum::<f64>();
        if positives == 0.0 || positives == y.len() as f64 {
            return Err(Error::classifier(
                "training labels must contain both questions and non-questions",
            ));
        }

        let start = Instant::now();
        let prior = positives / y.len() as f64;
        let init_score = (prior / (1.0 - prior)).ln();
        let mut raw = vec![init_score; y.len()];
        let indices: Vec<usize> = (0..y.len()).collect();
        let tree_params = params.tree_params();

        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut train_loss = Vec::with_capacity(params.n_estimators);

        for stage in 0..params.n_estimators {
            let probabilities: Vec<f64> = raw.iter().map(|&r| sigmoid(r)).collect();
            let residuals: Vec<f64> = y
                .iter()
                .zip(&probabilities)
                .map(|(target, p)| target - p)
                .collect();

            let newton_step = |leaf: &[usize]| {
                let numerator: f64 = leaf.iter().map(|&i| residuals[i]).sum();
                let denominator: f64 = leaf
                    .iter()
                    .map(|&i| probabilities[i] * (1.0 - probabilities[i]))
                    .sum();
                if denominator.abs() < 1e-150 {
                    0.0
                } else {
                    numerator / denominator
                }
            };

            let tree = RegressionTree::fit(features, &residuals, &indices, &tree_params, &newton_step)?;

            for (score, row) in raw.iter_mut().zip(features) {
                *score += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);

            let loss = deviance(&y, &raw);
            train_loss.push(loss);
            tracing::trace!(stage, loss, "Boosting stage complete");
        }

        tracing::debug!(
            stages = trees.len(),
            samples = y.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            final_loss = train_loss.last().copied().unwrap_or_default(),
            "Fitted gradient boosting classifier"
        );

        Ok(Self {
            params: *params,
            n_features,
            init_score,
            trees,
            train_loss,
        })
    }

    /// Probability of the question class
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        Ok(sigmoid(self.decision_function(features)?))
    }

    pub fn params(&self) -> &GbdtParams {
        &self.params
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn train_loss(&self) -> &[f64] {
        &self.train_loss
    }

    /// Check a deserialized model before it serves requests
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(Error::artifact("classifier has no trees"));
        }
        if !self.init_score.is_finite() || !self.params.learning_rate.is_finite() {
            return Err(Error::artifact("classifier has non-finite parameters"));
        }
        for tree in &self.trees {
            tree.validate(self.n_features)?;
        }
        Ok(())
    }
}

impl Classifier for GradientBoostingClassifier {
    fn decision_function(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.n_features {
            return Err(Error::dimension_mismatch(
                "classifier input",
                self.n_features,
                features.len(),
            ));
        }
        let boost: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        Ok(self.init_score + self.params.learning_rate * boost)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        "gradient_boosting"
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Mean binomial deviance computed from raw scores
fn deviance(y: &[f64], raw: &[f64]) -> f64 {
    let total: f64 = y
        .iter()
        .zip(raw)
        .map(|(target, score)| {
            // log(1 + exp(score)) - y * score, computed without overflow
            let softplus = if *score > 0.0 {
                score + (-score).exp().ln_1p()
            } else {
                score.exp().ln_1p()
            };
            softplus - target * score
        })
        .sum();
    2.0 * total / y.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two clusters separated along the first feature
    fn clusters() -> (Vec<Vec<f64>>, Vec<Label>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let jitter = (i % 5) as f64 * 0.01;
            features.push(vec![-1.0 - jitter, jitter]);
            labels.push(Label::NotQuestion);
            features.push(vec![1.0 + jitter, -jitter]);
            labels.push(Label::Question);
        }
        (features, labels)
    }

    #[test]
    fn test_separates_clusters() {
        let (features, labels) = clusters();
        let model = GradientBoostingClassifier::fit(&features, &labels, &GbdtParams::default())
            .unwrap();

        assert_eq!(model.predict(&[1.2, 0.0]).unwrap(), Label::Question);
        assert_eq!(model.predict(&[-1.2, 0.0]).unwrap(), Label::NotQuestion);
        assert!(model.predict_proba(&[1.2, 0.0]).unwrap() > 0.9);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_training_loss_decreases() {
        let (features, labels) = clusters();
        let params = GbdtParams {
            n_estimators: 20,
            ..Default::default()
        };
        let model = GradientBoostingClassifier::fit(&features, &labels, &params).unwrap();

        let losses = model.train_loss();
        assert_eq!(losses.len(), 20);
        assert!(losses.last().unwrap() < losses.first().unwrap());
    }

    #[test]
    fn test_rejects_single_class() {
        let features = vec![vec![0.0], vec![1.0]];
        let labels = vec![Label::Question, Label::Question];
        assert!(GradientBoostingClassifier::fit(&features, &labels, &GbdtParams::default()).is_err());
    }

    #[test]
    fn test_rejects_wrong_width() {
        let (features, labels) = clusters();
        let model = GradientBoostingClassifier::fit(&features, &labels, &GbdtParams::default())
            .unwrap();
        assert!(matches!(
            model.decision_function(&[1.0]),
            Err(Error::DimensionMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_serde_roundtrip_preserves_scores() {
        let (features, labels) = clusters();
        let params = GbdtParams {
            n_estimators: 10,
            ..Default::default()
        };
        let model = GradientBoostingClassifier::fit(&features, &labels, &params).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: GradientBoostingClassifier = serde_json::from_str(&json).unwrap();

        let x = [0.3, -0.1];
        assert_eq!(
            model.decision_function(&x).unwrap(),
            restored.decision_function(&x).unwrap()
        );
    }
}

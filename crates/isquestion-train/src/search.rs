//! Exhaustive hyperparameter search with stratified cross-validation

use std::time::Instant;

use isquestion_classifiers::{Classifier, GbdtParams, GradientBoostingClassifier};
use isquestion_core::{Error, Label, Result};
use serde::{Deserialize, Serialize};

use crate::split::stratified_folds;

/// Values tried for each searched hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub learning_rate: Vec<f64>,
    pub max_depth: Vec<usize>,
}

impl ParamGrid {
    /// 27-point grid
    pub fn full() -> Self {
        Self {
            n_estimators: vec![50, 100, 200],
            learning_rate: vec![0.01, 0.1, 1.0],
            max_depth: vec![1, 3, 5],
        }
    }

    /// Single point at the library defaults
    pub fn quick() -> Self {
        let defaults = GbdtParams::default();
        Self {
            n_estimators: vec![defaults.n_estimators],
            learning_rate: vec![defaults.learning_rate],
            max_depth: vec![defaults.max_depth],
        }
    }

    /// Every combination, `n_estimators` varying slowest
    pub fn candidates(&self) -> Vec<GbdtParams> {
        let mut out = Vec::new();
        for &n_estimators in &self.n_estimators {
            for &learning_rate in &self.learning_rate {
                for &max_depth in &self.max_depth {
                    out.push(GbdtParams {
                        n_estimators,
                        learning_rate,
                        max_depth,
                        ..Default::default()
                    });
                }
            }
        }
        out
    }
}

/// Cross-validated accuracy of one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: GbdtParams,
    pub mean_accuracy: f64,
    pub fold_accuracy: Vec<f64>,
}

/// Outcome of a grid search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best: CandidateScore,
    pub scores: Vec<CandidateScore>,
}

/// Score every grid point with `folds`-fold stratified cross-validation.
///
/// The first candidate with the highest mean accuracy wins.
pub fn grid_search(
    features: &[Vec<f64>],
    labels: &[Label],
    grid: &ParamGrid,
    folds: usize,
) -> Result<SearchResult> {
    let candidates = grid.candidates();
    if candidates.is_empty() {
        return Err(Error::config("parameter grid is empty"));
    }
    let splits = stratified_folds(labels, folds)?;

    let mut scores = Vec::with_capacity(candidates.len());
    for (i, params) in candidates.into_iter().enumerate() {
        let start = Instant::now();
        let mut fold_accuracy = Vec::with_capacity(splits.len());

        for (train, validation) in &splits {
            let train_x: Vec<Vec<f64>> = train.iter().map(|&j| features[j].clone()).collect();
            let train_y: Vec<Label> = train.iter().map(|&j| labels[j]).collect();
            let model = GradientBoostingClassifier::fit(&train_x, &train_y, &params)?;
            fold_accuracy.push(accuracy(&model, features, labels, validation)?);
        }

        let mean_accuracy = fold_accuracy.iter().sum::<f64>() / fold_accuracy.len() as f64;
        tracing::info!(
            candidate = i + 1,
            n_estimators = params.n_estimators,
            learning_rate = params.learning_rate,
            max_depth = params.max_depth,
            mean_accuracy,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scored candidate"
        );
        scores.push(CandidateScore {
            params,
            mean_accuracy,
            fold_accuracy,
        });
    }

    let best = scores
        .iter()
        .fold(None::<&CandidateScore>, |best, s| match best {
            Some(b) if b.mean_accuracy >= s.mean_accuracy => Some(b),
            _ => Some(s),
        })
        .cloned()
        .ok_or_else(|| Error::internal("grid search produced no scores"))?;

    Ok(SearchResult { best, scores })
}

fn accuracy(
    model: &GradientBoostingClassifier,
    features: &[Vec<f64>],
    labels: &[Label],
    indices: &[usize],
) -> Result<f64> {
    let mut correct = 0usize;
    for &i in indices {
        if model.predict(&features[i])? == labels[i] {
            correct += 1;
        }
    }
    Ok(correct as f64 / indices.len().max(1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<Label>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            let offset = i as f64 * 0.1;
            features.push(vec![1.0 + offset]);
            labels.push(Label::Question);
            features.push(vec![-1.0 - offset]);
            labels.push(Label::NotQuestion);
        }
        (features, labels)
    }

    #[test]
    fn test_full_grid_has_27_points() {
        let candidates = ParamGrid::full().candidates();
        assert_eq!(candidates.len(), 27);
        assert_eq!(candidates[0].n_estimators, 50);
        assert_eq!(candidates[0].learning_rate, 0.01);
        assert_eq!(candidates[0].max_depth, 1);
        assert_eq!(candidates[26].n_estimators, 200);
    }

    #[test]
    fn test_quick_grid_is_default() {
        assert_eq!(ParamGrid::quick().candidates(), vec![GbdtParams::default()]);
    }

    #[test]
    fn test_search_scores_every_candidate() {
        let (features, labels) = separable();
        let grid = ParamGrid {
            n_estimators: vec![5, 10],
            learning_rate: vec![0.1],
            max_depth: vec![1],
        };
        let result = grid_search(&features, &labels, &grid, 3).unwrap();

        assert_eq!(result.scores.len(), 2);
        assert!(result.scores.iter().all(|s| s.fold_accuracy.len() == 3));
        assert_eq!(result.best.mean_accuracy, 1.0);
        // Ties go to the first candidate
        assert_eq!(result.best.params.n_estimators, 5);
    }

    #[test]
    fn test_empty_grid_rejected() {
        let (features, labels) = separable();
        let grid = ParamGrid {
            n_estimators: vec![],
            learning_rate: vec![0.1],
            max_depth: vec![1],
        };
        assert!(grid_search(&features, &labels, &grid, 3).is_err());
    }
}

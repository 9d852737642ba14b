//! SMOTE oversampling of the minority class
//!
//! Each synthetic sample lies on the segment between a random minority
//! sample and one of its `k` nearest minority neighbours, at a uniformly
//! random position. Neighbours are found by brute force, which is fine at
//! the few-thousand-row scale of the reduced feature space.

use std::collections::HashMap;

use isquestion_core::{Error, Label, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Oversampling options
#[derive(Debug, Clone, Copy)]
pub struct SmoteConfig {
    /// Neighbours considered per minority sample
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for SmoteConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }
}

/// Append synthetic minority rows until both classes have the same count.
///
/// Returns the input unchanged when it is already balanced.
pub fn oversample(
    features: &[Vec<f64>],
    labels: &[Label],
    config: &SmoteConfig,
) -> Result<(Vec<Vec<f64>>, Vec<Label>)> {
    if features.len() != labels.len() {
        return Err(Error::dimension_mismatch(
            "smote labels",
            features.len(),
            labels.len(),
        ));
    }
    if config.k_neighbors == 0 {
        return Err(Error::config("k_neighbors must be at least 1"));
    }

    let positives = labels.iter().filter(|l| l.is_question()).count();
    let negatives = labels.len() - positives;
    let (minority_label, deficit) = if positives < negatives {
        (Label::Question, negatives - positives)
    } else {
        (Label::NotQuestion, positives - negatives)
    };

    let mut out_features = features.to_vec();
    let mut out_labels = labels.to_vec();
    if deficit == 0 {
        return Ok((out_features, out_labels));
    }

    let minority: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, l)| **l == minority_label)
        .map(|(i, _)| i)
        .collect();
    if minority.len() < 2 {
        return Err(Error::classifier(format!(
            "SMOTE needs at least 2 {} samples, found {}",
            minority_label,
            minority.len()
        )));
    }

    let k = config.k_neighbors.min(minority.len() - 1);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut neighbour_cache: HashMap<usize, Vec<usize>> = HashMap::new();

    for _ in 0..deficit {
        let anchor = minority[rng.gen_range(0..minority.len())];
        let neighbours = neighbour_cache
            .entry(anchor)
            .or_insert_with(|| nearest(features, &minority, anchor, k));
        let other = neighbours[rng.gen_range(0..neighbours.len())];
        let gap: f64 = rng.gen();

        let synthetic = features[anchor]
            .iter()
            .zip(&features[other])
            .map(|(a, b)| a + gap * (b - a))
            .collect();
        out_features.push(synthetic);
        out_labels.push(minority_label);
    }

    tracing::info!(
        minority = %minority_label,
        original = minority.len(),
        synthetic = deficit,
        k,
        "Oversampled minority class"
    );
    Ok((out_features, out_labels))
}

/// The `k` minority samples closest to `anchor`, excluding itself
fn nearest(features: &[Vec<f64>], minority: &[usize], anchor: usize, k: usize) -> Vec<usize> {
    let mut distances: Vec<(f64, usize)> = minority
        .iter()
        .filter(|&&i| i != anchor)
        .map(|&i| (squared_distance(&features[anchor], &features[i]), i))
        .collect();
    distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    distances.into_iter().take(k).map(|(_, i)| i).collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced() -> (Vec<Vec<f64>>, Vec<Label>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            features.push(vec![i as f64, 0.0]);
            labels.push(Label::NotQuestion);
        }
        for i in 0..3 {
            features.push(vec![100.0 + i as f64, 50.0]);
            labels.push(Label::Question);
        }
        (features, labels)
    }

    #[test]
    fn test_balances_classes() {
        let (features, labels) = imbalanced();
        let (out_features, out_labels) =
            oversample(&features, &labels, &SmoteConfig::default()).unwrap();

        assert_eq!(out_features.len(), 20);
        let positives = out_labels.iter().filter(|l| l.is_question()).count();
        assert_eq!(positives, 10);
        // Originals come first, untouched
        assert_eq!(out_features[..13], features[..]);
    }

    #[test]
    fn test_synthetic_rows_interpolate_minority() {
        let (features, labels) = imbalanced();
        let (out_features, _) = oversample(&features, &labels, &SmoteConfig::default()).unwrap();

        for row in &out_features[13..] {
            assert!((100.0..=102.0).contains(&row[0]), "{row:?}");
            assert_eq!(row[1], 50.0);
        }
    }

    #[test]
    fn test_seeded() {
        let (features, labels) = imbalanced();
        let config = SmoteConfig {
            k_neighbors: 2,
            seed: 3,
        };
        assert_eq!(
            oversample(&features, &labels, &config).unwrap(),
            oversample(&features, &labels, &config).unwrap()
        );
    }

    #[test]
    fn test_balanced_input_unchanged() {
        let features = vec![vec![0.0], vec![1.0]];
        let labels = vec![Label::Question, Label::NotQuestion];
        let (out, _) = oversample(&features, &labels, &SmoteConfig::default()).unwrap();
        assert_eq!(out, features);
    }

    #[test]
    fn test_single_minority_sample_is_an_error() {
        let features = vec![vec![0.0], vec![1.0], vec![2.0]];
        let labels = vec![Label::Question, Label::NotQuestion, Label::NotQuestion];
        assert!(oversample(&features, &labels, &SmoteConfig::default()).is_err());
    }
}

//! Regression trees used as boosting stages

use isquestion_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tree growth limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples required in each child
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// One node of a flattened tree; children always have larger indices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Binary regression tree stored as a flat node list rooted at index 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl RegressionTree {
    /// Grow a tree on `targets` using squared-error splits.
    ///
    /// Split points are chosen by variance reduction of the targets; leaf
    /// outputs come from `leaf_value`, which receives the sample indices that
    /// reached the leaf.
    pub fn fit<F>(
        features: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        params: &TreeParams,
        leaf_value: &F,
    ) -> Result<Self>
    where
        F: Fn(&[usize]) -> f64,
    {
        if features.len() != targets.len() {
            return Err(Error::dimension_mismatch(
                "tree targets",
                features.len(),
                targets.len(),
            ));
        }
        if indices.is_empty() {
            return Err(Error::classifier("cannot grow a tree on zero samples"));
        }

        let mut tree = Self { nodes: Vec::new() };
        tree.grow(features, targets, indices, 0, params, leaf_value);
        Ok(tree)
    }

    /// Recursively build the tree, returning the index of the created node
    fn grow<F>(
        &mut self,
        features: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        depth: usize,
        params: &TreeParams,
        leaf_value: &F,
    ) -> usize
    where
        F: Fn(&[usize]) -> f64,
    {
        let slot = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0 });

        let can_split = depth < params.max_depth
            && indices.len() >= params.min_samples_split.max(2)
            && indices.len() >= 2 * params.min_samples_leaf.max(1);

        let split = if can_split {
            best_split(features, targets, indices, params.min_samples_leaf.max(1))
        } else {
            None
        };

        match split {
            Some(split) => {
                let left = self.grow(features, targets, &split.left, depth + 1, params, leaf_value);
                let right = self.grow(features, targets, &split.right, depth + 1, params, leaf_value);
                self.nodes[slot] = Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left,
                    right,
                };
            }
            None => {
                self.nodes[slot] = Node::Leaf {
                    value: leaf_value(indices),
                };
            }
        }

        slot
    }

    /// Make a prediction for given features.
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            depth_of(&self.nodes, 0)
        }
    }

    /// Check that a deserialized tree is well formed for `n_features` inputs.
    ///
    /// Children must point forward, which rules out cycles in `predict`.
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::artifact("tree has no nodes"));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= n_features {
                    return Err(Error::dimension_mismatch(
                        "tree split feature",
                        n_features,
                        *feature + 1,
                    ));
                }
                if !threshold.is_finite() {
                    return Err(Error::artifact(format!("node {} has non-finite threshold", idx)));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(Error::artifact(format!(
                            "node {} has invalid child index {}",
                            idx, child
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Find the split with the largest squared-error reduction
fn best_split(
    features: &[Vec<f64>],
    targets: &[f64],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<SplitCandidate> {
    let n_features = features[indices[0]].len();
    let n = indices.len() as f64;
    let total: f64 = indices.iter().map(|&i| targets[i]).sum();
    let parent_score = total * total / n;

    let mut best: Option<(usize, f64, f64)> = None;
    let mut sorted = indices.to_vec();

    for feature in 0..n_features {
        sorted.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

        let mut left_sum = 0.0;
        for pos in 1..sorted.len() {
            left_sum += targets[sorted[pos - 1]];

            let left_count = pos;
            let right_count = sorted.len() - pos;
            if left_count < min_samples_leaf || right_count < min_samples_leaf {
                continue;
            }

            let lo = features[sorted[pos - 1]][feature];
            let hi = features[sorted[pos]][feature];
            if lo >= hi {
                continue;
            }

            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / left_count as f64
                + right_sum * right_sum / right_count as f64
                - parent_score;

            if best.map_or(true, |(_, _, g)| gain > g) {
                let mid = lo + (hi - lo) / 2.0;
                let threshold = if mid < hi { mid } else { lo };
                best = Some((feature, threshold, gain));
            }
        }
    }

    let (feature, threshold, gain) = best?;
    if gain <= 1e-12 {
        return None;
    }

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| features[i][feature] <= threshold);

    Some(SplitCandidate {
        feature,
        threshold,
        left,
        right,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean_leaf(targets: &[f64]) -> impl Fn(&[usize]) -> f64 + '_ {
        move |idx: &[usize]| idx.iter().map(|&i| targets[i]).sum::<f64>() / idx.len() as f64
    }

    #[test]
    fn test_fits_step_function() {
        let features: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 0.0]).collect();
        let targets: Vec<f64> = (0..10).map(|i| if i < 5 { -1.0 } else { 1.0 }).collect();
        let indices: Vec<usize> = (0..10).collect();

        let tree = RegressionTree::fit(
            &features,
            &targets,
            &indices,
            &TreeParams::default(),
            &mean_leaf(&targets),
        )
        .unwrap();

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&[2.0, 0.0]), -1.0);
        assert_eq!(tree.predict(&[7.0, 0.0]), 1.0);
        assert!(tree.validate(2).is_ok());
        assert!(tree.validate(0).is_err());
    }

    #[test]
    fn test_respects_max_depth_and_min_leaf() {
        let features: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let targets: Vec<f64> = (0..16).map(|i| (i * i) as f64).collect();
        let indices: Vec<usize> = (0..16).collect();

        let params = TreeParams {
            max_depth: 2,
            min_samples_split: 2,
            min_samples_leaf: 3,
        };
        let tree =
            RegressionTree::fit(&features, &targets, &indices, &params, &mean_leaf(&targets))
                .unwrap();
        assert!(tree.depth() <= 2);
        assert!(tree.node_count() <= 7);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let features: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let targets = vec![0.5; 5];
        let indices: Vec<usize> = (0..5).collect();

        let tree = RegressionTree::fit(
            &features,
            &targets,
            &indices,
            &TreeParams::default(),
            &mean_leaf(&targets),
        )
        .unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&[100.0]), 0.5);
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let json = r#"{"nodes":[
            {"type":"split","feature":0,"threshold":0.5,"left":0,"right":1},
            {"type":"leaf","value":1.0}
        ]}"#;
        let tree: RegressionTree = serde_json::from_str(json).unwrap();
        assert!(tree.validate(1).is_err());
    }
}

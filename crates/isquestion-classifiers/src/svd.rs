//! Truncated SVD dimensionality reduction
//!
//! Fitting uses randomized range finding: project the sparse training matrix
//! onto a random subspace, sharpen it with a few power iterations, then take
//! an exact SVD of the small projected matrix. Transforming a document is a
//! single sparse-dense product per component.

use isquestion_core::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::linalg::{dot, orthonormalize, symmetric_eigen};
use crate::tfidf::SparseVector;

/// Reducer fitting options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvdConfig {
    /// Output dimensionality
    #[serde(default = "default_components")]
    pub n_components: usize,

    /// Extra random directions sampled beyond `n_components`
    #[serde(default = "default_oversamples")]
    pub oversamples: usize,

    /// Power iterations used to sharpen the range estimate
    #[serde(default = "default_power_iterations")]
    pub power_iterations: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            n_components: default_components(),
            oversamples: default_oversamples(),
            power_iterations: default_power_iterations(),
            seed: default_seed(),
        }
    }
}

fn default_components() -> usize {
    100
}

fn default_oversamples() -> usize {
    10
}

fn default_power_iterations() -> usize {
    5
}

fn default_seed() -> u64 {
    42
}

/// Fitted truncated SVD projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruncatedSvd {
    /// Input width (vocabulary size of the vectorizer it was fit on)
    n_features: usize,

    /// Right singular vectors, `n_components` rows of `n_features` values
    components: Vec<Vec<f64>>,

    /// Singular values, descending
    singular_values: Vec<f64>,

    /// Fingerprint of the input feature space
    input_digest: String,
}

impl TruncatedSvd {
    /// Fit on the rows of a sparse matrix with `n_features` columns.
    pub fn fit(rows: &[SparseVector], n_features: usize, config: &SvdConfig) -> Result<Self> {
        let k = config.n_components;
        if k == 0 {
            return Err(Error::config("n_components must be at least 1"));
        }
        if rows.is_empty() {
            return Err(Error::classifier("cannot fit reducer on zero rows"));
        }
        if k > n_features.min(rows.len()) {
            return Err(Error::config(format!(
                "n_components ({}) exceeds min(rows, features) = min({}, {})",
                k,
                rows.len(),
                n_features
            )));
        }
        if let Some(row) = rows.iter().find(|row| row.dim != n_features) {
            return Err(Error::dimension_mismatch("svd fit", n_features, row.dim));
        }

        let sketch = (k + config.oversamples).min(n_features).min(rows.len());
        let mut rng = StdRng::seed_from_u64(config.seed);

        // Random test matrix, one column per sketch direction
        let omega: Vec<Vec<f64>> = (0..sketch)
            .map(|_| (0..n_features).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .collect();

        let mut q: Vec<Vec<f64>> = omega.iter().map(|w| multiply(rows, w)).collect();
        orthonormalize(&mut q);

        for _ in 0..config.power_iterations {
            let mut z: Vec<Vec<f64>> = q
                .iter()
                .map(|col| multiply_transpose(rows, col, n_features))
                .collect();
            orthonormalize(&mut z);
            q = z.iter().map(|col| multiply(rows, col)).collect();
            orthonormalize(&mut q);
        }

        // B = Q^T A, stored as its rows (each of width n_features)
        let b: Vec<Vec<f64>> = q
            .iter()
            .map(|col| multiply_transpose(rows, col, n_features))
            .collect();

        let gram: Vec<Vec<f64>> = b
            .iter()
            .map(|bi| b.iter().map(|bj| dot(bi, bj)).collect())
            .collect();
        let (eigenvalues, eigenvectors) = symmetric_eigen(&gram);

        let mut components = Vec::with_capacity(k);
        let mut singular_values = Vec::with_capacity(k);

        for (lambda, u) in eigenvalues.iter().zip(&eigenvectors).take(k) {
            let sigma = lambda.max(0.0).sqrt();
            let mut v = vec![0.0; n_features];
            if sigma > 1e-12 {
                for (weight, row) in u.iter().zip(&b) {
                    for (vj, bj) in v.iter_mut().zip(row) {
                        *vj += weight * bj;
                    }
                }
                v.iter_mut().for_each(|x| *x /= sigma);
            } else {
                tracing::warn!("Reducer component has zero singular value; training data is rank deficient");
            }
            flip_sign(&mut v);
            components.push(v);
            singular_values.push(sigma);
        }

        tracing::debug!(
            components = k,
            features = n_features,
            rows = rows.len(),
            "Fitted truncated SVD"
        );

        Ok(Self {
            n_features,
            components,
            singular_values,
            input_digest: String::new(),
        })
    }

    /// Record the fingerprint of the feature space this reducer expects
    pub fn with_input_digest(mut self, digest: impl Into<String>) -> Self {
        self.input_digest = digest.into();
        self
    }

    /// Project a sparse vector onto the fitted components
    pub fn transform(&self, features: &SparseVector) -> Result<Vec<f64>> {
        if features.dim != self.n_features {
            return Err(Error::dimension_mismatch(
                "svd transform",
                self.n_features,
                features.dim,
            ));
        }
        Ok(self
            .components
            .iter()
            .map(|component| features.dot(component))
            .collect())
    }

    pub fn transform_all(&self, rows: &[SparseVector]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform(row)).collect()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    pub fn input_digest(&self) -> &str {
        &self.input_digest
    }

    /// Check internal shape consistency of a deserialized reducer
    pub fn validate(&self) -> Result<()> {
        if self.components.is_empty() {
            return Err(Error::artifact("reducer has no components"));
        }
        if self.singular_values.len() != self.components.len() {
            return Err(Error::dimension_mismatch(
                "svd singular values",
                self.components.len(),
                self.singular_values.len(),
            ));
        }
        if let Some(row) = self.components.iter().find(|c| c.len() != self.n_features) {
            return Err(Error::dimension_mismatch(
                "svd component",
                self.n_features,
                row.len(),
            ));
        }
        Ok(())
    }
}

/// y = A x
fn multiply(rows: &[SparseVector], x: &[f64]) -> Vec<f64> {
    rows.iter().map(|row| row.dot(x)).collect()
}

/// z = A^T y
fn multiply_transpose(rows: &[SparseVector], y: &[f64], n_features: usize) -> Vec<f64> {
    let mut z = vec![0.0; n_features];
    for (row, &weight) in rows.iter().zip(y) {
        if weight == 0.0 {
            continue;
        }
        for &(idx, value) in &row.entries {
            z[idx] += weight * value;
        }
    }
    z
}

/// Make the largest-magnitude entry positive so output is deterministic
fn flip_sign(v: &mut [f64]) {
    let pivot = v
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(0.0);
    if pivot < 0.0 {
        v.iter_mut().for_each(|x| *x = -*x);
    }
}

//! TF-IDF vectorizer for text feature extraction.

use std::collections::{BTreeMap, HashMap, HashSet};

use isquestion_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::text::word_tokens;

/// Sparse vector: sorted `(index, value)` pairs in a space of width `dim`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    pub dim: usize,
    pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Dot product with a dense vector of the same width
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|&(idx, value)| value * dense[idx])
            .sum()
    }
}

/// Vectorizer fitting options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfIdfConfig {
    /// Drop terms found in fewer documents than this
    #[serde(default = "default_min_df")]
    pub min_df: usize,

    /// Keep only the most frequent terms
    #[serde(default)]
    pub max_features: Option<usize>,
}

impl Default for TfIdfConfig {
    fn default() -> Self {
        Self {
            min_df: default_min_df(),
            max_features: None,
        }
    }
}

fn default_min_df() -> usize {
    1
}

/// TF-IDF vectorizer with a fixed, sorted vocabulary.
///
/// Weights are raw term counts scaled by the smoothed inverse document
/// frequency `ln((1 + n) / (1 + df)) + 1`, then L2-normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "VectorizerState", into = "VectorizerState")]
pub struct TfIdfVectorizer {
    /// Terms in feature order
    terms: Vec<String>,
    /// Term -> feature index
    index: HashMap<String, usize>,
    /// Inverse document frequency per feature
    idf: Vec<f64>,
    /// Number of documents seen while fitting
    n_documents: usize,
}

/// On-disk form; the lookup index is rebuilt on load
#[derive(Serialize, Deserialize)]
struct VectorizerState {
    terms: Vec<String>,
    idf: Vec<f64>,
    n_documents: usize,
}

impl TryFrom<VectorizerState> for TfIdfVectorizer {
    type Error = Error;

    fn try_from(state: VectorizerState) -> Result<Self> {
        if state.terms.len() != state.idf.len() {
            return Err(Error::dimension_mismatch(
                "vectorizer idf",
                state.terms.len(),
                state.idf.len(),
            ));
        }

        let index: HashMap<String, usize> = state
            .terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();

        if index.len() != state.terms.len() {
            return Err(Error::artifact("vectorizer vocabulary contains duplicate terms"));
        }

        Ok(Self {
            terms: state.terms,
            index,
            idf: state.idf,
            n_documents: state.n_documents,
        })
    }
}

impl From<TfIdfVectorizer> for VectorizerState {
    fn from(vectorizer: TfIdfVectorizer) -> Self {
        Self {
            terms: vectorizer.terms,
            idf: vectorizer.idf,
            n_documents: vectorizer.n_documents,
        }
    }
}

impl TfIdfVectorizer {
    /// Fit the vectorizer on training documents.
    pub fn fit<S: AsRef<str>>(documents: &[S], config: &TfIdfConfig) -> Result<Self> {
        if documents.is_empty() {
            return Err(Error::classifier("cannot fit vectorizer on zero documents"));
        }

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut term_frequency: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = word_tokens(doc.as_ref());
            for token in &tokens {
                *term_frequency.entry(token.clone()).or_insert(0) += 1;
            }
            let unique: HashSet<String> = tokens.into_iter().collect();
            for token in unique {
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }

        let mut candidates: Vec<(String, usize)> = document_frequency
            .iter()
            .filter(|(_, df)| **df >= config.min_df)
            .map(|(term, _)| (term.clone(), term_frequency[term]))
            .collect();

        if let Some(max_features) = config.max_features {
            candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            candidates.truncate(max_features);
        }

        let mut terms: Vec<String> = candidates.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        if terms.is_empty() {
            return Err(Error::classifier(
                "empty vocabulary: documents contain no terms above min_df",
            ));
        }

        let n = documents.len() as f64;
        let idf = terms
            .iter()
            .map(|term| {
                let df = document_frequency[term] as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let index = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();

        tracing::debug!(
            vocabulary = terms.len(),
            documents = documents.len(),
            "Fitted TF-IDF vectorizer"
        );

        Ok(Self {
            terms,
            index,
            idf,
            n_documents: documents.len(),
        })
    }

    /// Transform a document into an L2-normalized TF-IDF vector.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in word_tokens(document) {
            if let Some(&idx) = self.index.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();

        let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, value) in &mut entries {
                *value /= norm;
            }
        }

        SparseVector {
            dim: self.terms.len(),
            entries,
        }
    }

    /// Transform many documents
    pub fn transform_all<S: AsRef<str>>(&self, documents: &[S]) -> Vec<SparseVector> {
        documents
            .iter()
            .map(|doc| self.transform(doc.as_ref()))
            .collect()
    }

    /// Get the size of the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Terms in feature order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// SHA-256 over the ordered vocabulary.
    ///
    /// A reducer records the digest of the vocabulary it was fit against so
    /// that feature ordering can be checked when artifacts are loaded.
    pub fn vocabulary_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for term in &self.terms {
            hasher.update(term.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

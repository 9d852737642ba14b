//! Model bundle: vectorizer, reducer, and classifier loaded together

use std::path::Path;
use std::sync::Arc;

use isquestion_core::{Error, Label, Result};

use crate::artifact::{self, ArtifactKind};
use crate::classifier::Classifier;
use crate::gbdt::GradientBoostingClassifier;
use crate::svd::TruncatedSvd;
use crate::tfidf::TfIdfVectorizer;

/// Immutable feature pipeline plus classifier.
///
/// Construction checks that the three components agree on vocabulary and
/// widths, so a bundle that exists is always internally consistent.
#[derive(Clone)]
pub struct ModelBundle {
    vectorizer: TfIdfVectorizer,
    reducer: TruncatedSvd,
    classifier: Arc<dyn Classifier>,
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("vocabulary_size", &self.vectorizer.vocabulary_size())
            .field("components", &self.reducer.n_components())
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

impl ModelBundle {
    /// Assemble a bundle from fitted components
    pub fn new(
        vectorizer: TfIdfVectorizer,
        reducer: TruncatedSvd,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self> {
        reducer.validate()?;

        if vectorizer.vocabulary_size() != reducer.n_features() {
            return Err(Error::dimension_mismatch(
                "reducer input",
                vectorizer.vocabulary_size(),
                reducer.n_features(),
            ));
        }

        let digest = vectorizer.vocabulary_digest();
        if reducer.input_digest() != digest {
            return Err(Error::artifact(format!(
                "reducer was fit on vocabulary {}, vectorizer has {}",
                short(reducer.input_digest()),
                short(&digest)
            )));
        }

        if reducer.n_components() != classifier.n_features() {
            return Err(Error::dimension_mismatch(
                "classifier input",
                reducer.n_components(),
                classifier.n_features(),
            ));
        }

        Ok(Self {
            vectorizer,
            reducer,
            classifier,
        })
    }

    /// Load all three artifacts from a directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        tracing::info!(dir = %dir.display(), "Loading model artifacts");

        let vectorizer: TfIdfVectorizer = artifact::load(dir, ArtifactKind::Vectorizer)?;
        let reducer: TruncatedSvd = artifact::load(dir, ArtifactKind::Reducer)?;
        let classifier: GradientBoostingClassifier = artifact::load(dir, ArtifactKind::Classifier)?;
        classifier.validate()?;

        let bundle = Self::new(vectorizer, reducer, Arc::new(classifier))?;
        tracing::info!(
            vocabulary = bundle.vectorizer.vocabulary_size(),
            components = bundle.reducer.n_components(),
            classifier = bundle.classifier.name(),
            "Model bundle ready"
        );
        Ok(bundle)
    }

    /// Write a freshly trained set of artifacts to `dir`
    pub fn save(
        dir: impl AsRef<Path>,
        vectorizer: &TfIdfVectorizer,
        reducer: &TruncatedSvd,
        classifier: &GradientBoostingClassifier,
    ) -> Result<()> {
        let dir = dir.as_ref();
        artifact::save(dir, ArtifactKind::Vectorizer, vectorizer)?;
        artifact::save(dir, ArtifactKind::Reducer, reducer)?;
        artifact::save(dir, ArtifactKind::Classifier, classifier)?;
        Ok(())
    }

    /// Dense feature vector for a normalized sentence
    pub fn features(&self, normalized: &str) -> Result<Vec<f64>> {
        let sparse = self.vectorizer.transform(normalized);
        self.reducer.transform(&sparse)
    }

    /// Label and decision score for a normalized sentence
    pub fn classify(&self, normalized: &str) -> Result<(Label, f64)> {
        let features = self.features(normalized)?;
        let score = self.classifier.decision_function(&features)?;
        if !score.is_finite() {
            return Err(Error::classifier(format!(
                "classifier produced non-finite score {}",
                score
            )));
        }
        Ok((Label::from_score(score), score))
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    pub fn reducer(&self) -> &TruncatedSvd {
        &self.reducer
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

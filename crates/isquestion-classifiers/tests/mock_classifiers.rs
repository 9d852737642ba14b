//! Mock classifiers and fixtures for testing
//!
//! Provides configurable implementations of the Classifier trait plus a
//! small fitted feature pipeline, so guard and override behavior can be
//! tested without a trained model.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use isquestion_classifiers::{
    Classifier, GuardConfig, LanguageDetector, Lexicon, ModelBundle, QuestionPipeline,
    StaticDetector, SvdConfig, TfIdfConfig, TfIdfVectorizer, TruncatedSvd,
};
use isquestion_core::Result;

/// Components produced by [`fitted_features`]
pub const COMPONENTS: usize = 3;

/// A classifier returning a fixed decision score
pub struct MockClassifier {
    name: String,
    score: f64,
    n_features: usize,
    call_count: AtomicU32,
}

impl MockClassifier {
    /// Create a mock that always answers "not question"
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            score: -1.0,
            n_features: COMPONENTS,
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the decision score this classifier will return
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Set the expected input width
    pub fn with_features(mut self, n_features: usize) -> Self {
        self.n_features = n_features;
        self
    }

    /// Get the number of times decision_function was called
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Classifier for MockClassifier {
    fn decision_function(&self, _features: &[f64]) -> Result<f64> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.score)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A classifier that always fails - for testing error paths
pub struct FailingClassifier {
    error_message: String,
}

impl FailingClassifier {
    pub fn new() -> Self {
        Self {
            error_message: "Simulated classifier failure".to_string(),
        }
    }

    /// Set a custom error message
    pub fn with_error(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }
}

impl Classifier for FailingClassifier {
    fn decision_function(&self, _features: &[f64]) -> Result<f64> {
        Err(isquestion_core::Error::classifier(&self.error_message))
    }

    fn n_features(&self) -> usize {
        COMPONENTS
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Training sentences for the fixture feature pipeline
pub fn corpus() -> Vec<&'static str> {
    vec![
        "how are you doing today",
        "what time does the store open",
        "where is the nearest train station",
        "can you help me with my homework",
        "the weather is nice today",
        "i went to the store yesterday",
        "the train was late again this morning",
        "my homework is finally done",
    ]
}

/// Vectorizer and reducer fit on [`corpus`], digests linked
pub fn fitted_features() -> (TfIdfVectorizer, TruncatedSvd) {
    let vectorizer = TfIdfVectorizer::fit(&corpus(), &TfIdfConfig::default()).unwrap();
    let rows = vectorizer.transform_all(&corpus());
    let config = SvdConfig {
        n_components: COMPONENTS,
        ..Default::default()
    };
    let reducer = TruncatedSvd::fit(&rows, vectorizer.vocabulary_size(), &config)
        .unwrap()
        .with_input_digest(vectorizer.vocabulary_digest());
    (vectorizer, reducer)
}

/// Bundle around the fixture features and the given classifier
pub fn bundle_with(classifier: Arc<dyn Classifier>) -> ModelBundle {
    let (vectorizer, reducer) = fitted_features();
    ModelBundle::new(vectorizer, reducer, classifier).unwrap()
}

/// Pipeline with the built-in lexicon and the given classifier and detector
pub fn pipeline_with(
    classifier: Arc<dyn Classifier>,
    detector: Arc<dyn LanguageDetector>,
) -> QuestionPipeline {
    QuestionPipeline::from_parts(
        GuardConfig::default(),
        Lexicon::builtin().unwrap(),
        detector,
        bundle_with(classifier),
    )
    .unwrap()
}

/// Pipeline whose model always says "not question", on English traffic
pub fn negative_pipeline() -> QuestionPipeline {
    pipeline_with(
        Arc::new(MockClassifier::new("negative")),
        Arc::new(StaticDetector::english()),
    )
}

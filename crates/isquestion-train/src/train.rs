//! Training and evaluation runs

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use isquestion_classifiers::{
    Classifier, GradientBoostingClassifier, ModelBundle, SvdConfig, TfIdfConfig, TfIdfVectorizer,
    TruncatedSvd,
};
use isquestion_core::Label;
use tracing::info;

use crate::dataset::Corpus;
use crate::report::{write_metrics, ClassificationReport, TrainingMetrics};
use crate::search::{grid_search, ParamGrid};
use crate::smote::{self, SmoteConfig};
use crate::split::train_test_split;

/// Options for one training run
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub questions: PathBuf,
    pub prose: PathBuf,
    pub sample_size: usize,
    pub test_size: f64,
    pub seed: u64,
    pub components: usize,
    pub grid: ParamGrid,
    pub cv_folds: usize,
    pub vectorizer: TfIdfConfig,
    pub out: PathBuf,
}

/// Fit all three artifacts, evaluate on held-out data, and write everything to `out`
pub fn run_train(options: &TrainOptions) -> Result<TrainingMetrics> {
    let start = Instant::now();

    info!("Starting data loading and preparation");
    let corpus = Corpus::load(&options.questions, &options.prose, options.sample_size)?;
    let metrics = run_train_on(corpus, options)?;

    info!(
        elapsed_s = start.elapsed().as_secs(),
        "Training pipeline completed"
    );
    Ok(metrics)
}

/// Training steps after the corpus is in memory
pub fn run_train_on(corpus: Corpus, options: &TrainOptions) -> Result<TrainingMetrics> {
    info!(
        samples = corpus.len(),
        questions = corpus.count(Label::Question),
        statements = corpus.count(Label::NotQuestion),
        "Splitting data"
    );
    let (train_idx, test_idx) = train_test_split(corpus.len(), options.test_size, options.seed)?;
    let train = corpus.select(&train_idx);
    let test = corpus.select(&test_idx);

    info!("Vectorizing data");
    let vectorizer = TfIdfVectorizer::fit(&train.texts, &options.vectorizer)?;
    let train_rows = vectorizer.transform_all(&train.texts);
    let test_rows = vectorizer.transform_all(&test.texts);

    let svd_config = SvdConfig {
        n_components: options.components,
        seed: options.seed,
        ..Default::default()
    };
    let reducer = TruncatedSvd::fit(&train_rows, vectorizer.vocabulary_size(), &svd_config)
        .context("Failed to fit truncated SVD")?
        .with_input_digest(vectorizer.vocabulary_digest());
    let train_x = reducer.transform_all(&train_rows)?;
    let test_x = reducer.transform_all(&test_rows)?;

    info!("Balancing data");
    let smote_config = SmoteConfig {
        seed: options.seed,
        ..Default::default()
    };
    let (balanced_x, balanced_y) = smote::oversample(&train_x, &train.labels, &smote_config)?;

    info!(
        candidates = options.grid.candidates().len(),
        folds = options.cv_folds,
        "Searching hyperparameters"
    );
    let search = grid_search(&balanced_x, &balanced_y, &options.grid, options.cv_folds)?;
    info!(
        params = ?search.best.params,
        cv_accuracy = search.best.mean_accuracy,
        "Selected hyperparameters"
    );

    info!("Training and evaluating the model");
    let classifier = GradientBoostingClassifier::fit(&balanced_x, &balanced_y, &search.best.params)?;
    let report = evaluate_features(&classifier, &test_x, &test.labels)?;
    info!(accuracy = report.accuracy, "Held-out evaluation\n{}", report);

    ModelBundle::save(&options.out, &vectorizer, &reducer, &classifier)?;

    let metrics = TrainingMetrics {
        created_at: Utc::now(),
        seed: options.seed,
        n_train: train.len(),
        n_test: test.len(),
        n_train_balanced: balanced_x.len(),
        vocabulary_size: vectorizer.vocabulary_size(),
        n_components: reducer.n_components(),
        best_params: search.best.params,
        cv_accuracy: search.best.mean_accuracy,
        search: search.scores,
        test: report,
    };
    write_metrics(&options.out, &metrics)?;
    Ok(metrics)
}

fn evaluate_features(
    classifier: &GradientBoostingClassifier,
    features: &[Vec<f64>],
    labels: &[Label],
) -> Result<ClassificationReport> {
    let predicted = features
        .iter()
        .map(|row| classifier.predict(row))
        .collect::<isquestion_core::Result<Vec<Label>>>()?;
    Ok(ClassificationReport::from_predictions(labels, &predicted))
}

/// Score a saved model bundle on a labeled corpus.
///
/// Only the statistical model is measured; the guard and override rule are
/// not applied.
pub fn run_evaluate(artifacts: &Path, corpus: &Corpus) -> Result<ClassificationReport> {
    let bundle = ModelBundle::load(artifacts)
        .with_context(|| format!("Failed to load artifacts from {}", artifacts.display()))?;

    let predicted = corpus
        .texts
        .iter()
        .map(|text| bundle.classify(text).map(|(label, _)| label))
        .collect::<isquestion_core::Result<Vec<Label>>>()?;

    let report = ClassificationReport::from_predictions(&corpus.labels, &predicted);
    info!(
        samples = corpus.len(),
        accuracy = report.accuracy,
        "Evaluation complete\n{}",
        report
    );
    Ok(report)
}

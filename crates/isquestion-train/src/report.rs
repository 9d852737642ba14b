//! Evaluation metrics and the metrics.json report

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use isquestion_classifiers::GbdtParams;
use isquestion_core::Label;
use serde::{Deserialize, Serialize};

use crate::search::CandidateScore;

/// File name of the report inside an artifact directory
pub const METRICS_FILE: &str = "metrics.json";

/// Precision, recall and F1 for one class (or an average)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics plus accuracy and averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub not_question: ClassMetrics,
    pub question: ClassMetrics,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Compare predictions with ground truth. Undefined ratios count as 0.
    pub fn from_predictions(truth: &[Label], predicted: &[Label]) -> Self {
        let total = truth.len().min(predicted.len());
        let correct = truth
            .iter()
            .zip(predicted)
            .filter(|(t, p)| t == p)
            .count();

        let not_question = class_metrics(truth, predicted, Label::NotQuestion);
        let question = class_metrics(truth, predicted, Label::Question);

        let macro_avg = ClassMetrics {
            precision: (not_question.precision + question.precision) / 2.0,
            recall: (not_question.recall + question.recall) / 2.0,
            f1: (not_question.f1 + question.f1) / 2.0,
            support: total,
        };

        let weight = |m: &ClassMetrics| m.support as f64 / total.max(1) as f64;
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            f(&not_question) * weight(&not_question) + f(&question) * weight(&question)
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        Self {
            accuracy: ratio(correct, total),
            not_question,
            question,
            macro_avg,
            weighted_avg,
        }
    }
}

fn class_metrics(truth: &[Label], predicted: &[Label], class: Label) -> ClassMetrics {
    let pairs = || truth.iter().zip(predicted);
    let true_positive = pairs().filter(|(t, p)| **t == class && **p == class).count();
    let predicted_positive = pairs().filter(|(_, p)| **p == class).count();
    let support = pairs().filter(|(t, _)| **t == class).count();

    let precision = ratio(true_positive, predicted_positive);
    let recall = ratio(true_positive, support);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassMetrics {
        precision,
        recall,
        f1,
        support,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (name, m) in [("not_question", &self.not_question), ("question", &self.question)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

/// Everything recorded about one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub created_at: DateTime<Utc>,
    pub seed: u64,
    pub n_train: usize,
    pub n_test: usize,
    /// Training rows after oversampling
    pub n_train_balanced: usize,
    pub vocabulary_size: usize,
    pub n_components: usize,
    pub best_params: GbdtParams,
    /// Mean cross-validation accuracy of `best_params`
    pub cv_accuracy: f64,
    pub search: Vec<CandidateScore>,
    pub test: ClassificationReport,
}

/// Write `value` as pretty JSON to `dir/metrics.json`
pub fn write_metrics<T: Serialize>(dir: &Path, value: &T) -> Result<()> {
    let path = dir.join(METRICS_FILE);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), "Wrote metrics");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use Label::{NotQuestion as N, Question as Q};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_report_values() {
        let truth = [Q, Q, Q, N, N];
        let predicted = [Q, Q, N, N, Q];
        let report = ClassificationReport::from_predictions(&truth, &predicted);

        assert!(approx(report.accuracy, 0.6));
        assert!(approx(report.question.precision, 2.0 / 3.0));
        assert!(approx(report.question.recall, 2.0 / 3.0));
        assert_eq!(report.question.support, 3);
        assert!(approx(report.not_question.precision, 0.5));
        assert!(approx(report.not_question.recall, 0.5));
        assert!(approx(report.macro_avg.f1, (2.0 / 3.0 + 0.5) / 2.0));
        assert!(approx(
            report.weighted_avg.recall,
            (2.0 / 3.0) * 0.6 + 0.5 * 0.4
        ));
    }

    #[test]
    fn test_missing_class_counts_as_zero() {
        let report = ClassificationReport::from_predictions(&[Q, Q], &[Q, Q]);
        assert!(approx(report.accuracy, 1.0));
        assert_eq!(report.not_question.support, 0);
        assert_eq!(report.not_question.precision, 0.0);
        assert_eq!(report.not_question.f1, 0.0);
    }

    #[test]
    fn test_display_table() {
        let report = ClassificationReport::from_predictions(&[Q, N], &[Q, N]);
        let table = report.to_string();
        assert!(table.contains("precision"));
        assert!(table.contains("weighted avg"));
        assert!(table.contains("1.00"));
    }

    #[test]
    fn test_write_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let report = ClassificationReport::from_predictions(&[Q, N], &[Q, Q]);
        write_metrics(dir.path(), &report).unwrap();

        let content = std::fs::read_to_string(dir.path().join(METRICS_FILE)).unwrap();
        let parsed: ClassificationReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, report);
    }
}

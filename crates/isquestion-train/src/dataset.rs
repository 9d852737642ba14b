//! Labeled corpora for training and evaluation
//!
//! Positives come from a file of questions, one per line. Negatives come
//! from free prose: each line is a document, split into sentences, and any
//! sentence that looks like a question is dropped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use isquestion_core::Label;
use regex::Regex;

/// First words that make a prose sentence look like a question
const INTERROGATIVES: &[&str] = &[
    "who", "what", "where", "when", "why", "how", "is", "are", "do", "does", "did", "was", "were",
    "have", "has", "had",
];

/// Texts with their labels, positives first
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub texts: Vec<String>,
    pub labels: Vec<Label>,
}

impl Corpus {
    /// Load questions and prose, capping each source at `sample_size` records
    pub fn load(questions: &Path, prose: &Path, sample_size: usize) -> Result<Self> {
        let question_lines = read_lines(questions, sample_size)?;
        let documents = read_lines(prose, sample_size)?;

        let splitter = SentenceSplitter::new()?;
        let statements: Vec<String> = documents
            .iter()
            .flat_map(|doc| splitter.split(doc))
            .filter(|sentence| !looks_like_question(sentence))
            .collect();

        tracing::info!(
            questions = question_lines.len(),
            documents = documents.len(),
            statements = statements.len(),
            "Loaded corpora"
        );

        let corpus = Self::from_parts(question_lines, statements);
        if corpus.count(Label::Question) == 0 || corpus.count(Label::NotQuestion) == 0 {
            bail!("both corpora must contribute at least one sentence");
        }
        Ok(corpus)
    }

    /// Label `questions` as positives and `statements` as negatives
    pub fn from_parts(questions: Vec<String>, statements: Vec<String>) -> Self {
        let labels = std::iter::repeat(Label::Question)
            .take(questions.len())
            .chain(std::iter::repeat(Label::NotQuestion).take(statements.len()))
            .collect();
        let mut texts = questions;
        texts.extend(statements);
        Self { texts, labels }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// Sub-corpus at the given positions
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            texts: indices.iter().map(|&i| self.texts[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

/// First `limit` non-blank lines of a file, trimmed
pub fn read_lines(path: &Path, limit: usize) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        if lines.len() >= limit {
            break;
        }
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    Ok(lines)
}

/// Splits prose on `.`, `!` and `?`, keeping the terminators
pub struct SentenceSplitter {
    pattern: Regex,
}

impl SentenceSplitter {
    pub fn new() -> Result<Self> {
        // A run of non-terminators followed by terminators, or a trailing run
        let pattern = Regex::new(r"[^.!?]+(?:[.!?]+|$)").context("Invalid sentence pattern")?;
        Ok(Self { pattern })
    }

    /// Sentences of `text`, trimmed; fragments without letters or digits are dropped
    pub fn split(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .filter(|s| s.chars().any(char::is_alphanumeric))
            .map(str::to_string)
            .collect()
    }
}

/// Ends in `?` or starts with an interrogative or auxiliary word
pub fn looks_like_question(sentence: &str) -> bool {
    let trimmed = sentence.trim_end();
    if trimmed.ends_with('?') {
        return true;
    }
    trimmed
        .split_whitespace()
        .next()
        .map(|first| INTERROGATIVES.contains(&first.to_lowercase().as_str()))
        .unwrap_or(false)
}

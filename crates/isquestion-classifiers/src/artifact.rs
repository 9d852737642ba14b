//! Artifact files exchanged between the trainer and the service
//!
//! Every artifact is a JSON envelope carrying its kind and format version
//! around the fitted component, so a file copied into the wrong slot or
//! written by an incompatible trainer is refused at load time.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use isquestion_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Envelope format understood by this build
pub const FORMAT_VERSION: u32 = 1;

/// The three artifacts making up a model bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Vectorizer,
    Reducer,
    Classifier,
}

impl ArtifactKind {
    /// File name inside an artifact directory
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Vectorizer => "vectorizer.json",
            Self::Reducer => "svd.json",
            Self::Classifier => "classifier.json",
        }
    }

    pub fn path_in(self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(self.file_name())
    }
}

/// On-disk envelope around a fitted component
#[derive(Debug, Serialize, Deserialize)]
pub struct Artifact<T> {
    pub kind: ArtifactKind,
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub payload: T,
}

/// Write `payload` as the `kind` artifact in `dir`, creating `dir` if needed
pub fn save<T: Serialize>(dir: impl AsRef<Path>, kind: ArtifactKind, payload: &T) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let path = kind.path_in(dir);
    let envelope = Artifact {
        kind,
        format_version: FORMAT_VERSION,
        created_at: Utc::now(),
        payload,
    };

    let file = File::create(&path)
        .map_err(|e| Error::artifact(format!("failed to create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &envelope)?;
    writer.flush()?;

    tracing::info!(kind = ?kind, path = %path.display(), "Wrote artifact");
    Ok(path)
}

/// Read the `kind` artifact from `dir`, checking kind and format version
pub fn load<T: DeserializeOwned>(dir: impl AsRef<Path>, kind: ArtifactKind) -> Result<T> {
    let path = kind.path_in(dir);
    let file = File::open(&path)
        .map_err(|e| Error::artifact(format!("failed to open {}: {}", path.display(), e)))?;

    let envelope: Artifact<T> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::artifact(format!("failed to parse {}: {}", path.display(), e)))?;

    if envelope.kind != kind {
        return Err(Error::artifact(format!(
            "{} holds a {:?} artifact, expected {:?}",
            path.display(),
            envelope.kind,
            kind
        )));
    }
    if envelope.format_version != FORMAT_VERSION {
        return Err(Error::artifact(format!(
            "{} has format version {}, this build reads version {}",
            path.display(),
            envelope.format_version,
            FORMAT_VERSION
        )));
    }

    tracing::debug!(
        kind = ?kind,
        path = %path.display(),
        created_at = %envelope.created_at,
        "Loaded artifact"
    );
    Ok(envelope.payload)
}

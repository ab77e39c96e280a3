//! Loading and persisting the fitted vectorizer and classifier.
//!
//! Both artifacts live as JSON files in one directory. Loading is eager and
//! validates everything up front, so a broken model directory fails at
//! startup instead of on the first prediction.

use super::TitleClassifier;
use super::boost::BoostedClassifier;
use super::vectorizer::{TfidfVectorizer, VectorizerArtifact};
use crate::error::ArtifactError;
use crate::models::Verdict;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";

/// The fitted vectorizer and classifier, read-only once built.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    vectorizer: TfidfVectorizer,
    classifier: BoostedClassifier,
}

impl ModelArtifacts {
    /// Pair a vectorizer with a classifier fitted on its output.
    ///
    /// # Errors
    ///
    /// Returns a description of the mismatch when the classifier is invalid or
    /// was fitted on a different dimension.
    pub fn new(vectorizer: TfidfVectorizer, classifier: BoostedClassifier) -> Result<Self, String> {
        classifier.validate()?;
        if classifier.dim != vectorizer.dim() {
            return Err(format!(
                "classifier expects dimension {} but vectorizer produces {}",
                classifier.dim,
                vectorizer.dim()
            ));
        }
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &BoostedClassifier {
        &self.classifier
    }

    /// Load and validate both artifacts from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] when a file is missing, unreadable, not valid
    /// JSON, or inconsistent.
    #[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let vectorizer_path = dir.join(VECTORIZER_FILE);
        let classifier_path = dir.join(CLASSIFIER_FILE);

        let raw_vectorizer: VectorizerArtifact = read_json(&vectorizer_path)?;
        let vectorizer =
            TfidfVectorizer::from_artifact(raw_vectorizer).map_err(|reason| ArtifactError::Invalid {
                path: vectorizer_path.clone(),
                reason,
            })?;
        let classifier: BoostedClassifier = read_json(&classifier_path)?;

        let artifacts = Self::new(vectorizer, classifier).map_err(|reason| {
            ArtifactError::Invalid {
                path: classifier_path,
                reason,
            }
        })?;
        info!(
            vocabulary = artifacts.vectorizer.dim(),
            trees = artifacts.classifier.trees.len(),
            "Loaded model artifacts"
        );
        Ok(artifacts)
    }

    /// Write both artifacts into `dir`.
    ///
    /// Both are serialized to temporary files first and then renamed into
    /// place. If the classifier cannot be put in place, the previous vectorizer
    /// is restored so the directory never holds a mixed pair.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Io`] when the directory or a file cannot be
    /// written.
    #[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
    pub fn save(&self, dir: &Path) -> Result<(), ArtifactError> {
        fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let vectorizer = stage(dir, VECTORIZER_FILE, &self.vectorizer.to_artifact())?;
        let classifier = match stage(dir, CLASSIFIER_FILE, &self.classifier) {
            Ok(staged) => staged,
            Err(e) => {
                discard(&vectorizer.tmp);
                return Err(e);
            }
        };

        let result = swap_in(&vectorizer, &classifier);
        discard(&vectorizer.tmp);
        discard(&classifier.tmp);
        result?;

        info!("Persisted model artifacts");
        Ok(())
    }
}

impl TitleClassifier for ModelArtifacts {
    fn classify(&self, normalized_title: &str) -> Verdict {
        let features = self.vectorizer.transform(normalized_title);
        self.classifier.predict(&features)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ArtifactError::Missing {
            path: path.to_path_buf(),
        },
        _ => ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

struct Staged {
    tmp: PathBuf,
    target: PathBuf,
}

fn stage<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<Staged, ArtifactError> {
    let target = dir.join(name);
    let tmp = dir.join(format!("{name}.tmp"));
    let json = serde_json::to_string(value).map_err(|source| ArtifactError::Corrupt {
        path: target.clone(),
        source,
    })?;
    if let Err(source) = fs::write(&tmp, json) {
        discard(&tmp);
        return Err(ArtifactError::Io { path: tmp, source });
    }
    Ok(Staged { tmp, target })
}

/// Rename both staged files into place, keeping the previous vectorizer as a
/// backup until the classifier has landed.
fn swap_in(vectorizer: &Staged, classifier: &Staged) -> Result<(), ArtifactError> {
    let backup = vectorizer.target.with_extension("json.bak");
    let had_previous = vectorizer.target.is_file();
    if had_previous {
        fs::rename(&vectorizer.target, &backup).map_err(|source| ArtifactError::Io {
            path: vectorizer.target.clone(),
            source,
        })?;
    }

    let restore = || {
        if had_previous {
            if let Err(e) = fs::rename(&backup, &vectorizer.target) {
                warn!(error = %e, "Failed to restore previous vectorizer");
            }
        } else {
            discard(&vectorizer.target);
        }
    };

    if let Err(source) = fs::rename(&vectorizer.tmp, &vectorizer.target) {
        restore();
        return Err(ArtifactError::Io {
            path: vectorizer.target.clone(),
            source,
        });
    }
    if let Err(source) = fs::rename(&classifier.tmp, &classifier.target) {
        restore();
        return Err(ArtifactError::Io {
            path: classifier.target.clone(),
            source,
        });
    }

    if had_previous {
        discard(&backup);
    }
    Ok(())
}

fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove leftover file"),
    }
}

//! TF-IDF vectorization of normalized titles.
//!
//! The vocabulary and IDF weights are learned once by [`TfidfVectorizer::fit`]
//! and never grow afterwards: at inference, tokens outside the vocabulary
//! contribute nothing.

use super::stopwords::is_stopword;
use crate::error::TrainingError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::info;

pub const VECTORIZER_FORMAT_VERSION: u32 = 1;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w\w+").unwrap());

/// A fixed-dimension feature vector stored sparsely.
///
/// `entries` holds `(index, value)` pairs sorted by index with non-zero values
/// only; every index not listed is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dim: usize,
    entries: Vec<(u32, f32)>,
}

impl FeatureVector {
    /// Build a vector from `(index, value)` pairs. Zero values are dropped and
    /// indices are sorted.
    ///
    /// # Panics
    ///
    /// Panics if an index is not below `dim`.
    pub fn from_entries(dim: usize, mut entries: Vec<(u32, f32)>) -> Self {
        entries.retain(|&(_, v)| v != 0.0);
        entries.sort_by_key(|&(i, _)| i);
        assert!(
            entries.iter().all(|&(i, _)| (i as usize) < dim),
            "feature index out of range"
        );
        Self { dim, entries }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn entries(&self) -> &[(u32, f32)] {
        &self.entries
    }

    /// Value at `index` (zero when absent).
    pub fn get(&self, index: u32) -> f32 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }
}

/// Serialized form of a fitted vectorizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    pub format_version: u32,
    pub vocabulary: Vec<String>,
    pub idf: Vec<f32>,
}

/// Fitted TF-IDF vectorizer.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: Vec<String>,
    idf: Vec<f32>,
    index: HashMap<String, u32>,
}

impl TfidfVectorizer {
    /// Learn a sorted vocabulary (stopwords excluded) and smoothed IDF weights
    /// from normalized titles.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::EmptyVocabulary`] when no title contributes a
    /// single usable token.
    pub fn fit<S: AsRef<str>>(titles: &[S]) -> Result<Self, TrainingError> {
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        for title in titles {
            let unique: BTreeSet<&str> = tokens(title.as_ref()).collect();
            for token in unique {
                *doc_freq.entry(token.to_string()).or_insert(0) += 1;
            }
        }
        if doc_freq.is_empty() {
            return Err(TrainingError::EmptyVocabulary);
        }

        // IDF(t) = ln((1 + N) / (1 + DF(t))) + 1
        let n = titles.len() as f32;
        let (vocabulary, idf): (Vec<String>, Vec<f32>) = doc_freq
            .into_iter()
            .map(|(term, df)| {
                let weight = ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0;
                (term, weight)
            })
            .unzip();

        info!(
            documents = titles.len(),
            vocabulary = vocabulary.len(),
            "Fitted TF-IDF vectorizer"
        );
        Ok(Self::from_parts(vocabulary, idf))
    }

    fn from_parts(vocabulary: Vec<String>, idf: Vec<f32>) -> Self {
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i as u32))
            .collect();
        Self {
            vocabulary,
            idf,
            index,
        }
    }

    /// Rebuild a vectorizer from its persisted form.
    ///
    /// # Errors
    ///
    /// Returns a description of the inconsistency when the artifact is invalid.
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self, String> {
        if artifact.format_version != VECTORIZER_FORMAT_VERSION {
            return Err(format!(
                "unsupported vectorizer format version {}",
                artifact.format_version
            ));
        }
        if artifact.vocabulary.len() != artifact.idf.len() {
            return Err(format!(
                "vocabulary has {} terms but idf has {} weights",
                artifact.vocabulary.len(),
                artifact.idf.len()
            ));
        }
        if artifact.vocabulary.is_empty() {
            return Err("vocabulary is empty".to_string());
        }
        if artifact.idf.iter().any(|w| !w.is_finite()) {
            return Err("idf contains non-finite weights".to_string());
        }
        let unique: BTreeSet<&String> = artifact.vocabulary.iter().collect();
        if unique.len() != artifact.vocabulary.len() {
            return Err("vocabulary contains duplicate terms".to_string());
        }
        Ok(Self::from_parts(artifact.vocabulary, artifact.idf))
    }

    pub fn to_artifact(&self) -> VectorizerArtifact {
        VectorizerArtifact {
            format_version: VECTORIZER_FORMAT_VERSION,
            vocabulary: self.vocabulary.clone(),
            idf: self.idf.clone(),
        }
    }

    /// Vocabulary size, i.e. the dimension of every produced vector.
    pub fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    /// L2-normalised TF-IDF vector of a normalized title.
    pub fn transform(&self, normalized_title: &str) -> FeatureVector {
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for token in tokens(normalized_title) {
            if let Some(&i) = self.index.get(token) {
                *counts.entry(i).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(u32, f32)> = counts
            .into_iter()
            .map(|(i, tf)| (i, tf * self.idf[i as usize]))
            .collect();
        let norm = entries.iter().map(|&(_, v)| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, v) in &mut entries {
                *v /= norm;
            }
        }
        FeatureVector::from_entries(self.dim(), entries)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|t| !is_stopword(t))
}

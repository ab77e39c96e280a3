//! Title classification: TF-IDF features fed to a boosted tree ensemble.
//!
//! - [`vectorizer`]: vocabulary, IDF weights and sparse feature vectors
//! - [`boost`]: gradient-boosted trees on the logistic loss
//! - [`artifacts`]: the persisted pair and its eager, validated loading
//!
//! The inference path only sees the [`TitleClassifier`] trait, so tests (or a
//! different model) can stand in for [`ModelArtifacts`].

pub mod artifacts;
pub mod boost;
mod stopwords;
pub mod vectorizer;

pub use artifacts::ModelArtifacts;

use crate::models::Verdict;

/// Something that can label a normalized title as news or not.
///
/// Implementations must be deterministic and free of interior mutation so a
/// single instance can be shared across concurrent runs.
pub trait TitleClassifier: Send + Sync {
    fn classify(&self, normalized_title: &str) -> Verdict;
}

//! Error types for the extraction, classification and training paths.
//!
//! Only conditions that stop a whole run are errors. Anything that concerns a
//! single candidate (a missing heading, an odd container) is absorbed locally
//! as a `None` field or a logged skip, see [`crate::scrapers::scanner::ScanIssue`].

use std::path::PathBuf;
use thiserror::Error;

/// Problems loading or compiling the runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid pattern '{pattern}' in rule '{rule}': {source}")]
    Pattern {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid selector '{selector}' in rule '{rule}': {reason}")]
    Selector {
        rule: String,
        selector: String,
        reason: String,
    },

    #[error("invalid base url '{url}': {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Problems loading or validating persisted model artifacts.
///
/// All of these are fatal: inference cannot run without a valid model.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("model artifact not found at {path}")]
    Missing { path: PathBuf },

    #[error("failed to access model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model artifact {path} is inconsistent: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Problems that abort a training run. No artifact is written when one occurs.
#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("failed to read corpus {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corpus is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("corpus has no usable rows after dropping duplicates and empty values")]
    EmptyCorpus,

    #[error("corpus has {rows} usable rows, too few for a held-out split")]
    TooFewRows { rows: usize },

    #[error("vocabulary is empty: every title consists only of stopwords or short tokens")]
    EmptyVocabulary,

    #[error("fitted models do not fit together: {0}")]
    InconsistentModel(String),

    #[error("failed to persist model artifacts: {0}")]
    Persist(#[from] ArtifactError),
}

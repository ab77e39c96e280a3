//! Runtime configuration.
//!
//! Everything that ties the pipeline to one page family lives here as data:
//! the rules that pick candidate containers, the rules that pick fields inside
//! them, the tokens the link heuristic looks for, and the boosting
//! hyperparameters. Every section has defaults for the current front-page
//! markup, so a config file is only needed when that markup drifts.
//!
//! ```yaml
//! scanner:
//!   rules:
//!     - name: news-slot
//!       selector: div
//!       attribute: class
//!       pattern: '^slot slot_\d+ noticia'
//! decision:
//!   policy: either
//! training:
//!   n_estimators: 200
//!   learning_rate: 0.05
//!   max_depth: 6
//! model_dir: models
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scanner: ScannerConfig,
    pub fields: FieldsConfig,
    pub decision: DecisionConfig,
    pub training: TrainingConfig,
    /// Directory holding `vectorizer.json` and `classifier.json`.
    pub model_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scanner: ScannerConfig::default(),
            fields: FieldsConfig::default(),
            decision: DecisionConfig::default(),
            training: TrainingConfig::default(),
            model_dir: PathBuf::from("models"),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, or return the defaults when no
    /// path is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            scanner_rules = config.scanner.rules.len(),
            "Loaded configuration"
        );
        Ok(config)
    }
}

/// A single structural match rule: elements selected by `selector` whose
/// `attribute` matches `pattern` (a regex searched against the attribute
/// value). Without a pattern the selector alone decides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    pub name: String,
    pub selector: String,
    #[serde(default = "default_attribute")]
    pub attribute: String,
    #[serde(default)]
    pub pattern: Option<String>,
}

fn default_attribute() -> String {
    "class".to_string()
}

impl MatchRule {
    pub fn new(name: &str, selector: &str, pattern: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            attribute: default_attribute(),
            pattern: pattern.map(str::to_string),
        }
    }
}

/// Rules identifying candidate article containers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub rules: Vec<MatchRule>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            rules: vec![MatchRule::new(
                "news-slot",
                "div",
                Some(r"^slot slot_\d+ noticia"),
            )],
        }
    }
}

/// Rules for pulling fields out of a candidate container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    /// Title rules in preference order; the first rule with a match wins.
    pub title: Vec<MatchRule>,
    /// Kicker rules in preference order.
    pub kicker: Vec<MatchRule>,
    /// Selector of the sub-container holding the article image.
    pub image_container: String,
    /// Base URL for resolving relative `href`/`src` values.
    pub base_url: Option<String>,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            title: vec![
                MatchRule::new("title-slab", "h2", Some("^titulo fuente_roboto_slab")),
                MatchRule::new("title-h1", "h1", None),
                MatchRule::new("title-h2", "h2", None),
                MatchRule::new("title-h3", "h3", None),
            ],
            kicker: vec![
                MatchRule::new("kicker-slab", "div", Some("^volanta fuente_roboto_slab")),
                MatchRule::new("kicker-h4", "h4", None),
                MatchRule::new("kicker-h5", "h5", None),
            ],
            image_container: "div.imagen".to_string(),
            base_url: None,
        }
    }
}

/// How the model verdict and the link heuristic are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPolicy {
    /// Accept when the model says news OR the heuristic holds.
    #[default]
    Either,
    /// Accept only when the model says news AND the heuristic holds.
    Both,
}

/// Decision engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub policy: DecisionPolicy,
    /// Substring marking a link as secure transport.
    pub secure_token: String,
    /// Substring marking a link as pointing into the news section.
    pub section_token: String,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            policy: DecisionPolicy::Either,
            secure_token: "https".to_string(),
            section_token: "news".to_string(),
        }
    }
}

/// Hyperparameters for fitting the boosted classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub n_estimators: usize,
    pub learning_rate: f32,
    pub max_depth: usize,
    /// L2 regularisation on leaf weights.
    pub lambda: f32,
    /// Minimum hessian mass per child.
    pub min_child_weight: f32,
    /// Share of the corpus held out for the accuracy report.
    pub test_size: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            learning_rate: 0.05,
            max_depth: 6,
            lambda: 1.0,
            min_child_weight: 1.0,
            test_size: 0.2,
            seed: 42,
        }
    }
}

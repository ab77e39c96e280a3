//! Offline training: fit the vectorizer and the boosted classifier from a
//! labelled corpus and persist both.
//!
//! The vectorizer is fitted on every normalized title; the classifier on a
//! seeded random share of the rows, with the rest held out for an accuracy
//! figure. That figure is reported, never used as a gate.

pub mod corpus;

use crate::classify::ModelArtifacts;
use crate::classify::boost::{BoostParams, BoostedClassifier};
use crate::classify::vectorizer::{FeatureVector, TfidfVectorizer};
use crate::config::TrainingConfig;
use crate::error::TrainingError;
use crate::models::{Label, TrainingExample};
use crate::utils::normalize_text;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::path::Path;
use tracing::{info, instrument};

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub artifacts: ModelArtifacts,
    /// Share of held-out rows classified correctly.
    pub accuracy: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Fit both models from labelled examples. Nothing is written to disk.
///
/// # Errors
///
/// Returns [`TrainingError`] when the corpus is empty, too small to hold out
/// at least one row on each side, or yields an empty vocabulary.
#[instrument(level = "info", skip_all, fields(rows = examples.len()))]
pub fn train(
    examples: &[TrainingExample],
    config: &TrainingConfig,
) -> Result<TrainingReport, TrainingError> {
    if examples.is_empty() {
        return Err(TrainingError::EmptyCorpus);
    }
    let (train_idx, test_idx) = split_indices(examples.len(), config.test_size, config.seed)?;

    let titles: Vec<String> = examples.iter().map(|e| normalize_text(&e.title)).collect();
    let vectorizer = TfidfVectorizer::fit(&titles)?;
    let features: Vec<FeatureVector> = titles.iter().map(|t| vectorizer.transform(t)).collect();

    let train_x: Vec<FeatureVector> = train_idx.iter().map(|&i| features[i].clone()).collect();
    let train_y: Vec<Label> = train_idx.iter().map(|&i| examples[i].label).collect();
    let classifier =
        BoostedClassifier::fit(&train_x, &train_y, vectorizer.dim(), BoostParams::from(config));

    let correct = test_idx
        .iter()
        .filter(|&&i| classifier.predict(&features[i]).label == examples[i].label)
        .count();
    let accuracy = correct as f64 / test_idx.len() as f64;
    info!(
        accuracy = %format!("{accuracy:.2}"),
        train_rows = train_idx.len(),
        test_rows = test_idx.len(),
        "Held-out accuracy"
    );

    Ok(TrainingReport {
        artifacts: assemble(vectorizer, classifier)?,
        accuracy,
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
    })
}

/// Load a corpus file, train, and persist the artifacts into `model_dir`.
///
/// Artifacts are only written once training has fully succeeded.
///
/// # Errors
///
/// Returns [`TrainingError`] for corpus, training or persistence failures.
pub fn train_from_file(
    corpus_path: &Path,
    config: &TrainingConfig,
    model_dir: &Path,
) -> Result<TrainingReport, TrainingError> {
    let examples = corpus::load_corpus(corpus_path)?;
    let report = train(&examples, config)?;
    report.artifacts.save(model_dir)?;
    Ok(report)
}

fn assemble(
    vectorizer: TfidfVectorizer,
    classifier: BoostedClassifier,
) -> Result<ModelArtifacts, TrainingError> {
    ModelArtifacts::new(vectorizer, classifier).map_err(TrainingError::InconsistentModel)
}

/// Seeded shuffle of `0..n`, split into (train, test) with
/// `ceil(test_size * n)` test rows.
fn split_indices(
    n: usize,
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), TrainingError> {
    let test_rows = (test_size * n as f64).ceil() as usize;
    if test_rows == 0 || test_rows >= n {
        return Err(TrainingError::TooFewRows { rows: n });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(test_rows);
    Ok((train, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::TitleClassifier;
    use crate::classify::boost::CLASSIFIER_FORMAT_VERSION;
    use crate::classify::artifacts::{CLASSIFIER_FILE, VECTORIZER_FILE};

    fn examples() -> Vec<TrainingExample> {
        let news = [
            "Casino revenue rises in Macau",
            "Regulator approves new casino license",
            "Casino sports betting handle hits record",
            "Casino operator reports quarterly revenue",
            "Macau casino visitors increase",
            "State regulator fines casino operator",
            "Casino betting revenue in New Jersey",
            "Casino operator announces expansion",
            "Casino group opens consultation",
            "Casino visitors record in December",
        ];
        let noise = [
            "Subscribe to our newsletter",
            "Contact us",
            "Advertise with us",
            "Privacy policy",
            "Subscribe today and save",
            "Login to your account",
            "Newsletter archive",
            "Terms and conditions",
            "Advertise here today",
            "Account settings",
        ];
        news.iter()
            .map(|t| (t, Label::News))
            .chain(noise.iter().map(|t| (t, Label::NotNews)))
            .map(|(t, label)| TrainingExample {
                title: t.to_string(),
                label,
            })
            .collect()
    }

    fn config() -> TrainingConfig {
        TrainingConfig {
            n_estimators: 30,
            learning_rate: 0.3,
            max_depth: 3,
            min_child_weight: 0.5,
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_split_is_seeded_and_disjoint() {
        let (train_a, test_a) = split_indices(20, 0.2, 42).unwrap();
        let (train_b, test_b) = split_indices(20, 0.2, 42).unwrap();
        assert_eq!((train_a.clone(), test_a.clone()), (train_b, test_b));
        assert_eq!(test_a.len(), 4);
        assert_eq!(train_a.len(), 16);
        let mut all = [train_a, test_a].concat();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_rejects_tiny_corpus() {
        assert!(matches!(
            split_indices(1, 0.2, 42),
            Err(TrainingError::TooFewRows { rows: 1 })
        ));
        assert!(split_indices(2, 0.2, 42).is_ok());
    }

    #[test]
    fn test_mismatched_pair_is_inconsistent_model() {
        let vectorizer = TfidfVectorizer::fit(&["casino revenue", "newsletter"]).unwrap();
        let classifier = BoostedClassifier {
            format_version: CLASSIFIER_FORMAT_VERSION,
            dim: vectorizer.dim() + 1,
            base_margin: 0.0,
            trees: Vec::new(),
        };
        let err = assemble(vectorizer, classifier).unwrap_err();
        assert!(matches!(err, TrainingError::InconsistentModel(_)));
        assert!(!err.to_string().contains("persist"));
    }

    #[test]
    fn test_train_reports_accuracy_and_classifies() {
        let report = train(&examples(), &config()).unwrap();
        assert_eq!(report.test_rows, 4);
        assert_eq!(report.train_rows, 16);
        assert!((0.0..=1.0).contains(&report.accuracy));

        let artifacts = &report.artifacts;
        assert_eq!(
            artifacts.classify(&normalize_text("Casino revenue record")).label,
            Label::News
        );
        assert_eq!(
            artifacts.classify(&normalize_text("Subscribe to newsletter")).label,
            Label::NotNews
        );
    }

    #[test]
    fn test_train_is_reproducible() {
        let a = train(&examples(), &config()).unwrap();
        let b = train(&examples(), &config()).unwrap();
        assert_eq!(a.accuracy, b.accuracy);
        assert_eq!(a.artifacts.classifier(), b.artifacts.classifier());
    }

    #[test]
    fn test_train_from_file_persists_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let corpus_path = dir.path().join("corpus.csv");
        let mut raw = String::from("Title;IsNews\n");
        for e in examples() {
            raw.push_str(&format!("{};{}\n", e.title, e.label.is_news()));
        }
        std::fs::write(&corpus_path, raw).unwrap();

        let model_dir = dir.path().join("models");
        train_from_file(&corpus_path, &config(), &model_dir).unwrap();
        assert!(model_dir.join(VECTORIZER_FILE).is_file());
        assert!(model_dir.join(CLASSIFIER_FILE).is_file());
        assert!(ModelArtifacts::load(&model_dir).is_ok());
    }

    #[test]
    fn test_failed_training_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let corpus_path = dir.path().join("corpus.csv");
        std::fs::write(&corpus_path, "Title;IsNews\nThe;1\nOf;0\nAnd;1\n").unwrap();

        let model_dir = dir.path().join("models");
        let err = train_from_file(&corpus_path, &config(), &model_dir).unwrap_err();
        assert!(matches!(err, TrainingError::EmptyVocabulary));
        assert!(!model_dir.exists());
    }
}

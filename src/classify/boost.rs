//! Gradient-boosted decision trees for binary classification.
//!
//! Trees are fitted on the logistic loss with second-order (gradient and
//! hessian) statistics and grown level-wise. Feature vectors are sparse: a zero
//! value counts as "absent", and every split learns which side absent values
//! go to.

use super::vectorizer::FeatureVector;
use crate::config::TrainingConfig;
use crate::models::{Label, Verdict};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub const CLASSIFIER_FORMAT_VERSION: u32 = 1;

const MIN_SPLIT_GAIN: f32 = 1e-6;
const MIN_HESSIAN: f32 = 1e-16;

/// Hyperparameters for [`BoostedClassifier::fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostParams {
    pub n_estimators: usize,
    pub learning_rate: f32,
    pub max_depth: usize,
    pub lambda: f32,
    pub min_child_weight: f32,
}

impl From<&TrainingConfig> for BoostParams {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            learning_rate: config.learning_rate,
            max_depth: config.max_depth,
            lambda: config.lambda,
            min_child_weight: config.min_child_weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: u32,
        threshold: f32,
        default_left: bool,
        left: u32,
        right: u32,
    },
    Leaf {
        value: f32,
    },
}

/// One regression tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn predict(&self, x: &FeatureVector) -> f32 {
        let mut idx = 0usize;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                } => {
                    let go_left = match x.get(feature) {
                        v if v == 0.0 => default_left,
                        v => v < threshold,
                    };
                    idx = (if go_left { left } else { right }) as usize;
                }
            }
        }
    }

    /// Children must point forward, which rules out cycles.
    fn validate(&self, dim: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Leaf { value } if !value.is_finite() => {
                    return Err(format!("leaf {idx} has a non-finite value"));
                }
                TreeNode::Leaf { .. } => {}
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if feature as usize >= dim {
                        return Err(format!(
                            "node {idx} splits on feature {feature} outside dimension {dim}"
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {idx} has a NaN threshold"));
                    }
                    for child in [left, right] {
                        let child = child as usize;
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {idx} has invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// A fitted boosted ensemble, also its persisted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedClassifier {
    pub format_version: u32,
    /// Dimension of the feature vectors the ensemble was fitted on.
    pub dim: usize,
    pub base_margin: f32,
    pub trees: Vec<RegressionTree>,
}

impl BoostedClassifier {
    /// Fit an ensemble on sparse feature vectors.
    ///
    /// `samples` and `labels` must have the same length and every sample must
    /// have dimension `dim`.
    #[instrument(level = "info", skip_all, fields(samples = samples.len(), dim = dim))]
    pub fn fit(samples: &[FeatureVector], labels: &[Label], dim: usize, params: BoostParams) -> Self {
        debug_assert_eq!(samples.len(), labels.len());
        let targets: Vec<f32> = labels
            .iter()
            .map(|l| if *l == Label::News { 1.0 } else { 0.0 })
            .collect();
        let columns = build_columns(samples, dim);

        let mut model = Self {
            format_version: CLASSIFIER_FORMAT_VERSION,
            dim,
            base_margin: 0.0,
            trees: Vec::with_capacity(params.n_estimators),
        };
        let mut margins = vec![model.base_margin; samples.len()];

        for round in 0..params.n_estimators {
            let (grad, hess): (Vec<f32>, Vec<f32>) = margins
                .iter()
                .zip(&targets)
                .map(|(&m, &y)| {
                    let p = sigmoid(m);
                    (p - y, (p * (1.0 - p)).max(MIN_HESSIAN))
                })
                .unzip();

            let tree = TreeBuilder {
                samples,
                columns: &columns,
                grad: &grad,
                hess: &hess,
                params,
            }
            .build();

            for (margin, sample) in margins.iter_mut().zip(samples) {
                *margin += tree.predict(sample);
            }
            debug!(round, nodes = tree.len(), "Fitted boosting round");
            model.trees.push(tree);
        }

        info!(trees = model.trees.len(), "Fitted boosted classifier");
        model
    }

    /// Probability that `x` is news.
    pub fn predict_proba(&self, x: &FeatureVector) -> f32 {
        let margin = self.base_margin + self.trees.iter().map(|t| t.predict(x)).sum::<f32>();
        sigmoid(margin)
    }

    pub fn predict(&self, x: &FeatureVector) -> Verdict {
        let probability = self.predict_proba(x);
        let label = if probability > 0.5 {
            Label::News
        } else {
            Label::NotNews
        };
        Verdict { label, probability }
    }

    /// Check a deserialized ensemble for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.format_version != CLASSIFIER_FORMAT_VERSION {
            return Err(format!(
                "unsupported classifier format version {}",
                self.format_version
            ));
        }
        if !self.base_margin.is_finite() {
            return Err("base margin is not finite".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.dim)
                .map_err(|reason| format!("tree {i}: {reason}"))?;
        }
        Ok(())
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Per-feature lists of `(row, value)` for non-zero values, sorted by value.
fn build_columns(samples: &[FeatureVector], dim: usize) -> Vec<Vec<(u32, f32)>> {
    let mut columns: Vec<Vec<(u32, f32)>> = vec![Vec::new(); dim];
    for (row, sample) in samples.iter().enumerate() {
        for &(feature, value) in sample.entries() {
            columns[feature as usize].push((row as u32, value));
        }
    }
    for column in &mut columns {
        column.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    }
    columns
}

#[derive(Debug, Clone, Copy, Default)]
struct Stats {
    g: f32,
    h: f32,
}

impl Stats {
    fn add(&mut self, g: f32, h: f32) {
        self.g += g;
        self.h += h;
    }

    fn minus(self, other: Stats) -> Stats {
        Stats {
            g: self.g - other.g,
            h: self.h - other.h,
        }
    }

    fn plus(self, other: Stats) -> Stats {
        Stats {
            g: self.g + other.g,
            h: self.h + other.h,
        }
    }

    fn score(self, lambda: f32) -> f32 {
        self.g * self.g / (self.h + lambda)
    }

    fn weight(self, lambda: f32) -> f32 {
        -self.g / (self.h + lambda)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    gain: f32,
    feature: u32,
    threshold: f32,
    default_left: bool,
    left: Stats,
    right: Stats,
}

struct FrontierNode {
    id: usize,
    total: Stats,
}

struct TreeBuilder<'a> {
    samples: &'a [FeatureVector],
    columns: &'a [Vec<(u32, f32)>],
    grad: &'a [f32],
    hess: &'a [f32],
    params: BoostParams,
}

impl TreeBuilder<'_> {
    fn build(self) -> RegressionTree {
        let lambda = self.params.lambda;
        let eta = self.params.learning_rate;

        let mut root = Stats::default();
        for (&g, &h) in self.grad.iter().zip(self.hess) {
            root.add(g, h);
        }

        let mut nodes = vec![TreeNode::Leaf { value: 0.0 }];
        // Node each row currently sits in.
        let mut position: Vec<usize> = vec![0; self.samples.len()];
        let mut frontier = vec![FrontierNode { id: 0, total: root }];

        for _depth in 0..self.params.max_depth {
            if frontier.is_empty() {
                break;
            }
            let best = self.find_splits(&frontier, &nodes, &position);

            let mut next = Vec::new();
            for (slot, node) in frontier.iter().enumerate() {
                match best[slot] {
                    Some(c) => {
                        let left = nodes.len();
                        let right = left + 1;
                        nodes.push(TreeNode::Leaf { value: 0.0 });
                        nodes.push(TreeNode::Leaf { value: 0.0 });
                        nodes[node.id] = TreeNode::Split {
                            feature: c.feature,
                            threshold: c.threshold,
                            default_left: c.default_left,
                            left: left as u32,
                            right: right as u32,
                        };
                        next.push(FrontierNode { id: left, total: c.left });
                        next.push(FrontierNode {
                            id: right,
                            total: c.right,
                        });
                    }
                    None => {
                        nodes[node.id] = TreeNode::Leaf {
                            value: node.total.weight(lambda) * eta,
                        };
                    }
                }
            }

            for (row, pos) in position.iter_mut().enumerate() {
                if let TreeNode::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                } = nodes[*pos]
                {
                    let v = self.samples[row].get(feature);
                    let go_left = if v == 0.0 { default_left } else { v < threshold };
                    *pos = (if go_left { left } else { right }) as usize;
                }
            }
            frontier = next;
        }

        for node in &frontier {
            nodes[node.id] = TreeNode::Leaf {
                value: node.total.weight(lambda) * eta,
            };
        }

        RegressionTree { nodes }
    }

    /// Best split per frontier node, scanning every feature column once.
    fn find_splits(
        &self,
        frontier: &[FrontierNode],
        nodes: &[TreeNode],
        position: &[usize],
    ) -> Vec<Option<Candidate>> {
        let mut slot_of: Vec<Option<usize>> = vec![None; nodes.len()];
        for (slot, node) in frontier.iter().enumerate() {
            slot_of[node.id] = Some(slot);
        }
        let slot_for = |row: u32| slot_of[position[row as usize]];

        let mut best: Vec<Option<Candidate>> = vec![None; frontier.len()];
        let mut present = vec![Stats::default(); frontier.len()];
        let mut prefix = vec![Stats::default(); frontier.len()];
        let mut last: Vec<Option<f32>> = vec![None; frontier.len()];

        for (feature, column) in self.columns.iter().enumerate() {
            if column.is_empty() {
                continue;
            }
            present.fill(Stats::default());
            prefix.fill(Stats::default());
            last.fill(None);

            for &(row, _) in column {
                if let Some(slot) = slot_for(row) {
                    present[slot].add(self.grad[row as usize], self.hess[row as usize]);
                }
            }

            for &(row, value) in column {
                let Some(slot) = slot_for(row) else {
                    continue;
                };
                // Rows scanned so far sit strictly below `value`, so it is the
                // threshold that sends exactly them left.
                let threshold = match last[slot] {
                    // Every present value goes right: a pure presence split.
                    None => Some(f32::MIN),
                    Some(prev) if value > prev => Some(value),
                    Some(_) => None,
                };
                if let Some(threshold) = threshold {
                    self.consider(
                        &mut best[slot],
                        frontier[slot].total,
                        present[slot],
                        prefix[slot],
                        feature as u32,
                        threshold,
                    );
                }
                prefix[slot].add(self.grad[row as usize], self.hess[row as usize]);
                last[slot] = Some(value);
            }

            for slot in 0..frontier.len() {
                if last[slot].is_some() {
                    self.consider(
                        &mut best[slot],
                        frontier[slot].total,
                        present[slot],
                        present[slot],
                        feature as u32,
                        f32::MAX,
                    );
                }
            }
        }
        best
    }

    /// Evaluate "present values below `threshold` go left" with absent values
    /// sent either way.
    fn consider(
        &self,
        best: &mut Option<Candidate>,
        total: Stats,
        present: Stats,
        present_left: Stats,
        feature: u32,
        threshold: f32,
    ) {
        let lambda = self.params.lambda;
        let missing = total.minus(present);
        let present_right = present.minus(present_left);

        for default_left in [true, false] {
            let (left, right) = if default_left {
                (present_left.plus(missing), present_right)
            } else {
                (present_left, present_right.plus(missing))
            };
            let min_weight = self.params.min_child_weight.max(MIN_HESSIAN);
            if left.h < min_weight || right.h < min_weight {
                continue;
            }
            let gain = 0.5 * (left.score(lambda) + right.score(lambda) - total.score(lambda));
            if gain <= MIN_SPLIT_GAIN {
                continue;
            }
            if best.is_none_or(|b| gain > b.gain) {
                *best = Some(Candidate {
                    gain,
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                });
            }
        }
    }
}

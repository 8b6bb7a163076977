use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::model::{GbdtModel, MODEL_VERSION, Tree, raw_to_proba};
use super::objective::Objective;
use super::tree::{BinnedFeatures, TreeParams, grow_tree};
use crate::ml::{TrainError, metrics};

/// Rounds without validation improvement before boosting stops.
pub const EARLY_STOPPING_ROUNDS: usize = 10;

/// Floor applied to per-row hessians.
const MIN_HESSIAN: f64 = 1e-6;

/// Training hyperparameters for tree boosting.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    /// Maximum number of boosting rounds.
    pub rounds: usize,
    /// Learning rate applied per round.
    pub learning_rate: f32,
    pub max_depth: usize,
    /// Number of bins used for split search.
    pub bins: usize,
    /// L2 penalty on leaf weights.
    pub lambda: f32,
    /// Minimum hessian sum allowed in a child.
    pub min_child_weight: f32,
    /// Fraction of training rows sampled per round.
    pub subsample: f32,
    /// Expected label-space size, if the caller pins one.
    pub num_class: Option<usize>,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            rounds: 100,
            learning_rate: 0.3,
            max_depth: 3,
            bins: 32,
            lambda: 1.0,
            min_child_weight: 1.0,
            subsample: 1.0,
            num_class: None,
            seed: 42,
        }
    }
}

impl TrainOptions {
    fn validate(&self) -> Result<(), TrainError> {
        let invalid = |msg: &str| Err(TrainError::InvalidOption(msg.to_string()));
        if self.rounds == 0 {
            return invalid("rounds must be at least 1");
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return invalid("learning_rate must be positive");
        }
        if self.bins < 2 {
            return invalid("bins must be at least 2");
        }
        if !(self.lambda >= 0.0 && self.min_child_weight >= 0.0) {
            return invalid("lambda and min_child_weight must be non-negative");
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return invalid("subsample must be within (0, 1]");
        }
        Ok(())
    }
}

/// In-memory dataset used for training and evaluation.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Class codes aligned with `x`.
    pub y: Vec<usize>,
    /// Size of the label space the codes were encoded against.
    pub n_classes: usize,
}

impl TrainDataset {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    fn check(&self, split: &'static str, n_features: usize) -> Result<(), TrainError> {
        if self.is_empty() {
            return Err(TrainError::EmptyDataset { split });
        }
        if self.x.len() != self.y.len() {
            return Err(TrainError::LengthMismatch {
                features: self.x.len(),
                labels: self.y.len(),
            });
        }
        if let Some(row) = self.x.iter().find(|row| row.len() != n_features) {
            return Err(TrainError::FeatureWidth {
                expected: n_features,
                found: row.len(),
            });
        }
        if let Some(&code) = self.y.iter().find(|&&code| code >= self.n_classes) {
            return Err(TrainError::LabelOutOfRange {
                code,
                n_classes: self.n_classes,
            });
        }
        Ok(())
    }
}

/// Per-round losses recorded while boosting.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalHistory {
    /// `mlogloss` or `logloss`.
    pub metric: String,
    pub train: Vec<f32>,
    pub validation: Vec<f32>,
    /// Zero-based round with the lowest validation loss.
    pub best_round: usize,
}

impl EvalHistory {
    pub fn rounds(&self) -> usize {
        self.train.len()
    }

    pub fn best_validation_loss(&self) -> Option<f32> {
        self.validation.get(self.best_round).copied()
    }
}

/// Train a boosted-tree classifier, stopping early on `validation` loss.
///
/// The returned model keeps the rounds up to and including the best one.
pub fn train_gbdt(
    train: &TrainDataset,
    validation: &TrainDataset,
    objective: Objective,
    options: &TrainOptions,
) -> Result<(GbdtModel, EvalHistory), TrainError> {
    options.validate()?;
    let n_classes = train.n_classes;
    objective.check_label_space(n_classes)?;
    if let Some(expected) = options.num_class.filter(|&k| k != n_classes) {
        return Err(TrainError::NumClassMismatch {
            expected,
            found: n_classes,
        });
    }
    if validation.n_classes != n_classes {
        return Err(TrainError::NumClassMismatch {
            expected: n_classes,
            found: validation.n_classes,
        });
    }
    let n_features = train.x.first().map(Vec::len).unwrap_or(0);
    train.check("train", n_features)?;
    validation.check("validation", n_features)?;

    let groups = objective.output_groups(n_classes);
    let binned = BinnedFeatures::fit(&train.x, n_features, options.bins);
    let params = TreeParams {
        max_depth: options.max_depth,
        lambda: options.lambda as f64,
        min_child_weight: options.min_child_weight as f64,
    };
    let base_raw = initial_raw(objective, &train.y, n_classes);
    let mut raw_train = vec![base_raw.clone(); train.len()];
    let mut raw_valid = vec![base_raw.clone(); validation.len()];
    let mut rng = StdRng::seed_from_u64(options.seed);

    let metric = objective.eval_metric();
    let mut history = EvalHistory {
        metric: metric.to_string(),
        train: Vec::new(),
        validation: Vec::new(),
        best_round: 0,
    };
    let mut best_loss = f32::INFINITY;
    let mut rounds_out: Vec<Vec<Tree>> = Vec::with_capacity(options.rounds);
    for round in 0..options.rounds {
        let (grads, hess) = gradients(objective, &raw_train, &train.y, groups);
        let rows = sample_rows(train.len(), options.subsample, &mut rng);

        let mut trees_for_round = Vec::with_capacity(groups);
        for group in 0..groups {
            let tree = grow_tree(&train.x, &binned, &grads[group], &hess[group], rows.clone(), params);
            apply_tree(&tree, &train.x, &mut raw_train, group, options.learning_rate);
            apply_tree(&tree, &validation.x, &mut raw_valid, group, options.learning_rate);
            trees_for_round.push(tree);
        }
        rounds_out.push(trees_for_round);

        let train_loss = loss(objective, &raw_train, &train.y);
        let valid_loss = loss(objective, &raw_valid, &validation.y);
        history.train.push(train_loss);
        history.validation.push(valid_loss);
        debug!("[{round}] train-{metric}:{train_loss:.5} validation-{metric}:{valid_loss:.5}");

        if valid_loss < best_loss {
            best_loss = valid_loss;
            history.best_round = round;
        } else if round - history.best_round >= EARLY_STOPPING_ROUNDS {
            info!(
                "Stopping. Best iteration: [{}] validation-{metric}:{best_loss:.5}",
                history.best_round
            );
            break;
        }
    }
    rounds_out.truncate(history.best_round + 1);

    let model = GbdtModel {
        model_version: MODEL_VERSION,
        objective,
        n_features,
        n_classes,
        learning_rate: options.learning_rate,
        base_raw,
        trees: rounds_out,
    };
    Ok((model, history))
}

fn class_priors(y: &[usize], n_classes: usize) -> Vec<f32> {
    let mut counts = vec![0usize; n_classes];
    for &label in y {
        if label < n_classes {
            counts[label] += 1;
        }
    }
    let total = y.len().max(1) as f32;
    counts.into_iter().map(|c| c as f32 / total).collect()
}

fn initial_raw(objective: Objective, y: &[usize], n_classes: usize) -> Vec<f32> {
    let priors = class_priors(y, n_classes);
    match objective {
        Objective::BinaryLogistic => {
            let p = priors[1].clamp(1e-6, 1.0 - 1e-6);
            vec![(p / (1.0 - p)).ln()]
        }
        Objective::MultiSoftprob | Objective::MultiSoftmax => {
            priors.iter().map(|&p| p.max(1e-6).ln()).collect()
        }
    }
}

/// Gradients and hessians of the log loss, shaped `[group][row]`.
fn gradients(
    objective: Objective,
    raw: &[Vec<f32>],
    y: &[usize],
    groups: usize,
) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let n = y.len();
    let mut grads = vec![vec![0f64; n]; groups];
    let mut hess = vec![vec![0f64; n]; groups];
    for (i, (scores, &label)) in raw.iter().zip(y).enumerate() {
        let probs = raw_to_proba(objective, scores);
        match objective {
            Objective::BinaryLogistic => {
                let p = probs[1] as f64;
                let target = if label == 1 { 1.0 } else { 0.0 };
                grads[0][i] = p - target;
                hess[0][i] = (p * (1.0 - p)).max(MIN_HESSIAN);
            }
            Objective::MultiSoftprob | Objective::MultiSoftmax => {
                for k in 0..groups {
                    let p = probs[k] as f64;
                    let target = if label == k { 1.0 } else { 0.0 };
                    grads[k][i] = p - target;
                    hess[k][i] = (2.0 * p * (1.0 - p)).max(MIN_HESSIAN);
                }
            }
        }
    }
    (grads, hess)
}

fn sample_rows(n: usize, subsample: f32, rng: &mut StdRng) -> Vec<usize> {
    if subsample >= 1.0 {
        return (0..n).collect();
    }
    let rows: Vec<usize> = (0..n).filter(|_| rng.random::<f32>() < subsample).collect();
    if rows.is_empty() {
        vec![rng.random_range(0..n)]
    } else {
        rows
    }
}

fn apply_tree(tree: &Tree, x: &[Vec<f32>], raw: &mut [Vec<f32>], group: usize, lr: f32) {
    for (row, scores) in x.iter().zip(raw.iter_mut()) {
        scores[group] += lr * tree.predict(row);
    }
}

fn loss(objective: Objective, raw: &[Vec<f32>], y: &[usize]) -> f32 {
    let probs: Vec<Vec<f32>> = raw.iter().map(|r| raw_to_proba(objective, r)).collect();
    metrics::log_loss(&probs, y)
}

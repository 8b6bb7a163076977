use serde::{Deserialize, Serialize};

use super::objective::Objective;
use crate::ml::TrainError;

/// Current on-disk model format.
pub const MODEL_VERSION: i64 = 1;

/// Tree node. Children are indices into [`Tree::nodes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: u16,
        /// Rows with `feature <= threshold` go left.
        threshold: f32,
        left: u32,
        right: u32,
    },
    Leaf {
        value: f32,
    },
}

/// Regression tree; the root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn leaf(value: f32) -> Self {
        Self {
            nodes: vec![Node::Leaf { value }],
        }
    }

    /// Leaf value reached by a feature vector.
    pub fn predict(&self, features: &[f32]) -> f32 {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature as usize).copied().unwrap_or(0.0);
                    idx = if value <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                None => return 0.0,
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left as usize).max(walk(nodes, *right as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split { left, right, .. } = node {
                let (left, right) = (*left as usize, *right as usize);
                if left <= idx || right <= idx || left >= self.nodes.len() || right >= self.nodes.len()
                {
                    return Err(format!("node {idx} has invalid children"));
                }
            }
        }
        Ok(())
    }
}

/// Gradient-boosted tree classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    /// Model format version.
    pub model_version: i64,
    pub objective: Objective,
    pub n_features: usize,
    pub n_classes: usize,
    /// Learning rate applied to each tree output.
    pub learning_rate: f32,
    /// Raw scores before any boosting round, one per output group.
    pub base_raw: Vec<f32>,
    /// Shape: `[n_rounds][output_groups]`.
    pub trees: Vec<Vec<Tree>>,
}

impl GbdtModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), TrainError> {
        let invalid = |reason: String| TrainError::InvalidModel(reason);
        if self.model_version != MODEL_VERSION {
            return Err(invalid(format!(
                "unsupported model version {}",
                self.model_version
            )));
        }
        self.objective.check_label_space(self.n_classes)?;
        let groups = self.objective.output_groups(self.n_classes);
        if self.base_raw.len() != groups {
            return Err(invalid(format!(
                "base_raw has {} entries but expected {groups}",
                self.base_raw.len()
            )));
        }
        for (round_idx, round) in self.trees.iter().enumerate() {
            if round.len() != groups {
                return Err(invalid(format!(
                    "round {round_idx} has {} trees but expected {groups}",
                    round.len()
                )));
            }
            for tree in round {
                tree.validate()
                    .map_err(|reason| invalid(format!("round {round_idx}: {reason}")))?;
            }
        }
        Ok(())
    }

    pub fn rounds(&self) -> usize {
        self.trees.len()
    }

    /// Raw scores, one per output group.
    pub fn predict_raw(&self, features: &[f32]) -> Vec<f32> {
        let mut raw = self.base_raw.clone();
        for round in &self.trees {
            for (group, tree) in round.iter().enumerate() {
                raw[group] += self.learning_rate * tree.predict(features);
            }
        }
        raw
    }

    /// Class probabilities for a feature vector (length `n_classes`).
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        raw_to_proba(self.objective, &self.predict_raw(features))
    }

    /// Best class index for a feature vector.
    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

/// Map raw scores to class probabilities for `objective`.
pub fn raw_to_proba(objective: Objective, raw: &[f32]) -> Vec<f32> {
    match objective {
        Objective::BinaryLogistic => {
            let p = sigmoid(raw.first().copied().unwrap_or(0.0));
            vec![1.0 - p, p]
        }
        Objective::MultiSoftprob | Objective::MultiSoftmax => softmax(raw),
    }
}

/// Compute a numerically-stable softmax for a set of logits.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let exps: Vec<f32> = raw.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

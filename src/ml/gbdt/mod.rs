//! Deterministic gradient-boosted tree classifier.
//!
//! Depth-limited histogram trees fitted with second-order gain, supporting:
//! - Multi-class softmax boosting (`multi:softprob`, `multi:softmax`).
//! - Binary logistic boosting (`binary:logistic`).
//! - Early stopping on a validation set.
//! - Reproducible JSON model export/load.

mod model;
mod objective;
mod train;
mod tree;

pub use model::{GbdtModel, MODEL_VERSION, Node, Tree, sigmoid, softmax};
pub use objective::Objective;
pub use train::{EARLY_STOPPING_ROUNDS, EvalHistory, TrainDataset, TrainOptions, train_gbdt};

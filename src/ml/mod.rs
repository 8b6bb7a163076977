//! Model training and inference.
//!
//! [`Trainer`] fits the boosted-tree classifier in [`gbdt`] on persisted
//! partitions, tracks held-out accuracy and writes [`ModelArtifact`] files
//! that the prediction form loads back.

mod artifact;
pub mod gbdt;
pub mod metrics;
mod plot;
mod trainer;

use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::ArtifactError;

pub use artifact::{ModelArtifact, accuracy_file_name};
pub use gbdt::{EvalHistory, Objective, TrainOptions};
pub use plot::{LOSS_PLOT_FILE, plot_loss_curves, render_loss_curves};
pub use trainer::{EvalSplit, Trainer};

/// Errors raised while training, saving or loading a model.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Unknown objective '{0}'")]
    UnknownObjective(String),
    #[error("Objective {objective} cannot model {n_classes} classes")]
    ObjectiveMismatch {
        objective: &'static str,
        n_classes: usize,
    },
    #[error("Expected {expected} classes but the labels have {found}")]
    NumClassMismatch { expected: usize, found: usize },
    #[error("Label code {code} is outside the {n_classes} known classes")]
    LabelOutOfRange { code: usize, n_classes: usize },
    #[error("The {split} set is empty")]
    EmptyDataset { split: &'static str },
    #[error("{features} feature rows but {labels} labels")]
    LengthMismatch { features: usize, labels: usize },
    #[error("Expected {expected} features per row, found {found}")]
    FeatureWidth { expected: usize, found: usize },
    #[error("Invalid training option: {0}")]
    InvalidOption(String),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Model expects features {model:?} but got {data:?}")]
    SchemaMismatch {
        model: Vec<String>,
        data: Vec<String>,
    },
    #[error("No model has been fitted or loaded")]
    NotFitted,
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse model {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize model: {0}")]
    Serialize(serde_json::Error),
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to save plot {path}: {source}")]
    Plot {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Failed to draw loss chart: {0}")]
    Chart(String),
}

//! Interactive prediction form.
//!
//! The form reads the persisted training features and label encoder once per
//! session, lets the operator pick a model and enter measurements, and shows
//! the decoded species with its picture.

mod app;
mod catalog;
mod images;
mod predictor;
pub mod ranges;
mod session;

use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::{ArtifactError, DatasetError};
use crate::ml::TrainError;

pub use app::{FORM_TITLE, FormApp, FormPaths};
pub use catalog::{list_models, model_path};
pub use images::{GENERIC_IMAGE, HEADER_IMAGE, load_color_image};
pub use predictor::{Prediction, predict_one};
pub use ranges::{FieldRange, FieldRangeError, range_for};
pub use session::{FeatureField, SessionId, SessionMemo, feature_fields};

/// Errors surfaced in the form's status line.
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Cannot bound field '{column}': {source}")]
    Range {
        column: String,
        source: FieldRangeError,
    },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error("Failed to list models in {path}: {source}")]
    ModelsDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("No model selected")]
    NoModelSelected,
    #[error("The model returned no prediction")]
    NoPrediction,
    #[error("Failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
}

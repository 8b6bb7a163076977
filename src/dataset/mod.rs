//! Dataset preparation: load the raw CSV, project features, encode labels,
//! clean missing values, split stratified partitions and persist them.

pub mod artifacts;
mod clean;
mod encoder;
pub mod loader;
mod prepare;
mod split;
mod table;

use std::path::PathBuf;

use thiserror::Error;

pub use artifacts::{Artifact, ArtifactError, PartitionSet, load_partitions, persist};
pub use clean::clean;
pub use encoder::{LabelEncoder, encode_label};
pub use loader::load;
pub use prepare::{DEFAULT_FEATURES, DEFAULT_LABEL, PrepareOptions, PrepareSummary, prepare};
pub use split::{Partitions, SplitError, split};
pub use table::{
    EncodedLabels, FeatureTable, LabelSeries, MISSING_MARKERS, RawTable, select_features,
    select_label,
};

/// Errors raised while preparing the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("No header row in {path}")]
    EmptyTable { path: PathBuf },
    #[error("Missing column '{column}'")]
    MissingColumn { column: String },
    #[error("Column '{column}' row {row}: '{value}' is not a number")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },
    #[error("Row {row} has no label")]
    MissingLabel { row: usize },
    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("Row index {index} has no matching label")]
    IndexMismatch { index: usize },
    #[error("Row index {index} appears more than once")]
    DuplicateIndex { index: usize },
    #[error("Label '{label}' was not seen when the encoder was fitted")]
    UnknownLabel { label: String },
    #[error("Code {code} is outside the {n_classes} encoded classes")]
    UnknownCode { code: usize, n_classes: usize },
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

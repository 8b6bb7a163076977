//! JSON artifacts shared between the preparation, training and form stages.
//!
//! Every file under the processed-data directory is one tagged [`Artifact`]
//! named `<stem>.json`. Stems are fixed: [`X_TRAIN`], [`X_TEST`], [`Y_TRAIN`],
//! [`Y_TEST`] and [`Y_ENCODER`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::encoder::LabelEncoder;
use super::split::Partitions;
use super::table::{EncodedLabels, FeatureTable};

pub const X_TRAIN: &str = "X_train";
pub const X_TEST: &str = "X_test";
pub const Y_TRAIN: &str = "y_train";
pub const Y_TEST: &str = "y_test";
pub const Y_ENCODER: &str = "y_encoder";
/// File extension for every artifact.
pub const ARTIFACT_EXT: &str = "json";

#[derive(Debug, Error)]
pub enum ArtifactError {
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
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unreadable artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize artifact {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("No artifacts found in {path}")]
    EmptyDir { path: PathBuf },
    #[error("Missing artifact '{name}'")]
    Missing { name: String },
    #[error("Artifact '{name}' holds {found}, expected {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Train columns {train:?} differ from test columns {test:?}")]
    ColumnMismatch {
        train: Vec<String>,
        test: Vec<String>,
    },
}

/// One persisted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Artifact {
    Features(FeatureTable),
    Labels(EncodedLabels),
    Encoder(LabelEncoder),
}

impl Artifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Features(_) => "features",
            Artifact::Labels(_) => "labels",
            Artifact::Encoder(_) => "encoder",
        }
    }
}

/// Borrowed twin of [`Artifact`] so persisting does not clone tables.
#[derive(Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
enum ArtifactRef<'a> {
    Features(&'a FeatureTable),
    Labels(&'a EncodedLabels),
    Encoder(&'a LabelEncoder),
}

/// Path of the artifact `stem` inside `dir`.
pub fn artifact_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}.{ARTIFACT_EXT}"))
}

/// Write the four partitions and the encoder under `dir`, returning the paths written.
pub fn persist(
    partitions: &Partitions,
    encoder: &LabelEncoder,
    dir: &Path,
) -> Result<Vec<PathBuf>, ArtifactError> {
    fs::create_dir_all(dir).map_err(|source| ArtifactError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let entries = [
        (X_TRAIN, ArtifactRef::Features(&partitions.x_train)),
        (X_TEST, ArtifactRef::Features(&partitions.x_test)),
        (Y_TRAIN, ArtifactRef::Labels(&partitions.y_train)),
        (Y_TEST, ArtifactRef::Labels(&partitions.y_test)),
        (Y_ENCODER, ArtifactRef::Encoder(encoder)),
    ];
    let mut written = Vec::with_capacity(entries.len());
    for (stem, artifact) in entries {
        let path = artifact_path(dir, stem);
        write_json(&path, &artifact)?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Read every artifact in `dir` into a map keyed by file stem.
///
/// Dotfiles and files with other extensions are skipped.
pub fn load_partitions(dir: &Path) -> Result<BTreeMap<String, Artifact>, ArtifactError> {
    let entries = fs::read_dir(dir).map_err(|source| ArtifactError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut artifacts = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|source| ArtifactError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let Some(stem) = artifact_stem(&path) else {
            continue;
        };
        artifacts.insert(stem, read_artifact(&path)?);
    }
    if artifacts.is_empty() {
        return Err(ArtifactError::EmptyDir {
            path: dir.to_path_buf(),
        });
    }
    Ok(artifacts)
}

/// Read a single artifact file.
pub fn read_artifact(path: &Path) -> Result<Artifact, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a feature table artifact.
pub fn read_features(path: &Path) -> Result<FeatureTable, ArtifactError> {
    match read_artifact(path)? {
        Artifact::Features(table) => Ok(table),
        other => Err(wrong_kind(path, "features", &other)),
    }
}

/// Read a label encoder artifact.
pub fn read_encoder(path: &Path) -> Result<LabelEncoder, ArtifactError> {
    match read_artifact(path)? {
        Artifact::Encoder(encoder) => Ok(encoder),
        other => Err(wrong_kind(path, "encoder", &other)),
    }
}

/// The four partitions plus the encoder, picked out of a loaded artifact map.
#[derive(Debug, Clone)]
pub struct PartitionSet {
    pub x_train: FeatureTable,
    pub x_test: FeatureTable,
    pub y_train: EncodedLabels,
    pub y_test: EncodedLabels,
    pub encoder: LabelEncoder,
}

impl PartitionSet {
    /// Load and validate the partition set stored in `dir`.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        Self::from_artifacts(load_partitions(dir)?)
    }

    pub fn from_artifacts(mut map: BTreeMap<String, Artifact>) -> Result<Self, ArtifactError> {
        let x_train = take_features(&mut map, X_TRAIN)?;
        let x_test = take_features(&mut map, X_TEST)?;
        let y_train = take_labels(&mut map, Y_TRAIN)?;
        let y_test = take_labels(&mut map, Y_TEST)?;
        let encoder = match take(&mut map, Y_ENCODER)? {
            Artifact::Encoder(encoder) => encoder,
            other => return Err(kind_error(Y_ENCODER, "encoder", &other)),
        };
        if x_train.columns != x_test.columns {
            return Err(ArtifactError::ColumnMismatch {
                train: x_train.columns,
                test: x_test.columns,
            });
        }
        Ok(Self {
            x_train,
            x_test,
            y_train,
            y_test,
            encoder,
        })
    }
}

fn take(map: &mut BTreeMap<String, Artifact>, name: &str) -> Result<Artifact, ArtifactError> {
    map.remove(name).ok_or_else(|| ArtifactError::Missing {
        name: name.to_string(),
    })
}

fn take_features(
    map: &mut BTreeMap<String, Artifact>,
    name: &str,
) -> Result<FeatureTable, ArtifactError> {
    match take(map, name)? {
        Artifact::Features(table) => Ok(table),
        other => Err(kind_error(name, "features", &other)),
    }
}

fn take_labels(
    map: &mut BTreeMap<String, Artifact>,
    name: &str,
) -> Result<EncodedLabels, ArtifactError> {
    match take(map, name)? {
        Artifact::Labels(labels) => Ok(labels),
        other => Err(kind_error(name, "labels", &other)),
    }
}

fn kind_error(name: &str, expected: &'static str, found: &Artifact) -> ArtifactError {
    ArtifactError::WrongKind {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

fn wrong_kind(path: &Path, expected: &'static str, found: &Artifact) -> ArtifactError {
    kind_error(&path.display().to_string(), expected, found)
}

/// Stem of a visible `*.json` file, or `None` for anything to skip.
pub(crate) fn artifact_stem(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some(ARTIFACT_EXT) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.starts_with('.') || stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let bytes = serde_json::to_vec(value).map_err(|source| ArtifactError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })
}

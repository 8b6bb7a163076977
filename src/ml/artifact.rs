use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::TrainError;
use super::gbdt::{GbdtModel, Objective};
use crate::dataset::FeatureTable;

/// A fitted classifier plus what produced it. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub objective: Objective,
    pub seed: u64,
    /// Feature columns, in the order the model reads them.
    pub feature_names: Vec<String>,
    /// Zero-based boosting round kept as the last one.
    pub best_round: usize,
    pub model: GbdtModel,
}

impl ModelArtifact {
    pub fn validate(&self) -> Result<(), TrainError> {
        self.model.validate()?;
        if self.model.objective != self.objective {
            return Err(TrainError::InvalidModel(format!(
                "artifact objective {} differs from model objective {}",
                self.objective, self.model.objective
            )));
        }
        if self.feature_names.len() != self.model.n_features {
            return Err(TrainError::InvalidModel(format!(
                "{} feature names for a model reading {} features",
                self.feature_names.len(),
                self.model.n_features
            )));
        }
        Ok(())
    }

    /// Load and validate a model from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, TrainError> {
        let bytes = fs::read(path).map_err(|source| TrainError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Self = serde_json::from_slice(&bytes).map_err(|source| TrainError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write the model as JSON, creating parent directories.
    pub fn save_json(&self, path: &Path) -> Result<(), TrainError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| TrainError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let bytes = serde_json::to_vec_pretty(self).map_err(TrainError::Serialize)?;
        fs::write(path, bytes).map_err(|source| TrainError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fail unless `columns` are exactly the features the model was trained on.
    pub fn check_columns(&self, columns: &[String]) -> Result<(), TrainError> {
        if self.feature_names != columns {
            return Err(TrainError::SchemaMismatch {
                model: self.feature_names.clone(),
                data: columns.to_vec(),
            });
        }
        Ok(())
    }

    /// Class probabilities per row.
    pub fn predict_proba(&self, features: &FeatureTable) -> Result<Vec<Vec<f32>>, TrainError> {
        self.check_columns(&features.columns)?;
        Ok(features
            .dense_rows()
            .iter()
            .map(|row| self.model.predict_proba(row))
            .collect())
    }

    /// Predicted class code per row.
    pub fn predict(&self, features: &FeatureTable) -> Result<Vec<usize>, TrainError> {
        self.check_columns(&features.columns)?;
        Ok(features
            .dense_rows()
            .iter()
            .map(|row| self.model.predict_class_index(row))
            .collect())
    }
}

/// `<dir>/<stem>_acc_<accuracy>.<ext>` for a model saved at `path`.
pub fn accuracy_file_name(path: &Path, accuracy: f32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    let ext = path
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "json".to_string());
    path.with_file_name(format!("{stem}_acc_{accuracy:.3}.{ext}"))
}

use std::path::{Path, PathBuf};

use tracing::info;

use super::TrainError;
use super::artifact::{ModelArtifact, accuracy_file_name};
use super::gbdt::{EvalHistory, Objective, TrainDataset, TrainOptions, train_gbdt};
use super::metrics::{ConfusionMatrix, accuracy};
use crate::dataset::{EncodedLabels, FeatureTable, PartitionSet};

/// Partition scored by [`Trainer::accuracy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalSplit {
    Train,
    #[default]
    Test,
}

/// Fits, scores and persists a classifier over one partition set.
#[derive(Debug, Clone)]
pub struct Trainer {
    partitions: PartitionSet,
    options: TrainOptions,
    artifact: Option<ModelArtifact>,
    history: Option<EvalHistory>,
    held_accuracy: Option<f32>,
}

impl Trainer {
    pub fn new(partitions: PartitionSet) -> Self {
        Self {
            partitions,
            options: TrainOptions::default(),
            artifact: None,
            history: None,
            held_accuracy: None,
        }
    }

    /// Load the partitions persisted in `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, TrainError> {
        info!("Loading partitions from {}", dir.display());
        Ok(Self::new(PartitionSet::load(dir)?))
    }

    pub fn with_options(mut self, options: TrainOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &TrainOptions {
        &self.options
    }

    pub fn partitions(&self) -> &PartitionSet {
        &self.partitions
    }

    /// The fitted or loaded model, if any.
    pub fn artifact(&self) -> Option<&ModelArtifact> {
        self.artifact.as_ref()
    }

    /// Test accuracy of the current model, updated by `fit` and `load`.
    pub fn held_accuracy(&self) -> Option<f32> {
        self.held_accuracy
    }

    /// Train on `X_train`, early-stopping against `X_test`, and return the
    /// test accuracy.
    pub fn fit(&mut self, objective: Objective, seed: u64) -> Result<f32, TrainError> {
        let encoder_classes = self.partitions.encoder.n_classes();
        for labels in [&self.partitions.y_train, &self.partitions.y_test] {
            if labels.n_classes != encoder_classes {
                return Err(TrainError::NumClassMismatch {
                    expected: encoder_classes,
                    found: labels.n_classes,
                });
            }
        }
        let options = TrainOptions {
            seed,
            ..self.options.clone()
        };
        let train = dataset(&self.partitions.x_train, &self.partitions.y_train);
        let validation = dataset(&self.partitions.x_test, &self.partitions.y_test);

        info!(
            "Fitting {objective} on {} rows, {} classes, up to {} rounds",
            train.len(),
            train.n_classes,
            options.rounds
        );
        let (model, history) = train_gbdt(&train, &validation, objective, &options)?;
        info!(
            "Kept {} of {} rounds ({} best: {:.5})",
            model.rounds(),
            history.rounds(),
            history.metric,
            history.best_validation_loss().unwrap_or(f32::NAN)
        );

        self.artifact = Some(ModelArtifact {
            objective,
            seed,
            feature_names: self.partitions.x_train.columns.clone(),
            best_round: history.best_round,
            model,
        });
        self.history = Some(history);
        let score = self.accuracy(EvalSplit::Test)?;
        self.held_accuracy = Some(score);
        info!("Accuracy: {:.2}%", score * 100.0);
        Ok(score)
    }

    /// Per-round losses of the last `fit`. Loaded models carry none.
    pub fn evaluate(&self) -> Result<&EvalHistory, TrainError> {
        self.history.as_ref().ok_or(TrainError::NotFitted)
    }

    /// Predicted class codes for `features`.
    pub fn predict(&self, features: &FeatureTable) -> Result<Vec<usize>, TrainError> {
        self.require_model()?.predict(features)
    }

    pub fn accuracy(&self, split: EvalSplit) -> Result<f32, TrainError> {
        Ok(accuracy(&self.confusion_matrix(split)?))
    }

    pub fn confusion_matrix(&self, split: EvalSplit) -> Result<ConfusionMatrix, TrainError> {
        let (features, labels) = self.split(split);
        let predicted = self.predict(features)?;
        Ok(ConfusionMatrix::from_predictions(
            self.partitions.encoder.n_classes(),
            &labels.codes,
            &predicted,
        ))
    }

    /// Write the model to `path`, or to `<stem>_acc_<accuracy>.<ext>` next to
    /// it when `embed_accuracy` is set. Returns the path written.
    pub fn save(&self, path: &Path, embed_accuracy: bool) -> Result<PathBuf, TrainError> {
        let artifact = self.require_model()?;
        let target = if embed_accuracy {
            let score = match self.held_accuracy {
                Some(score) => score,
                None => self.accuracy(EvalSplit::Test)?,
            };
            accuracy_file_name(path, score)
        } else {
            path.to_path_buf()
        };
        artifact.save_json(&target)?;
        info!("Model saved to {}", target.display());
        Ok(target)
    }

    /// Replace the current model with the one stored at `path` and rescore it
    /// against the test partition.
    pub fn load(&mut self, path: &Path) -> Result<f32, TrainError> {
        let artifact = ModelArtifact::load_json(path)?;
        artifact.check_columns(&self.partitions.x_train.columns)?;
        let n_classes = self.partitions.encoder.n_classes();
        if artifact.model.n_classes != n_classes {
            return Err(TrainError::NumClassMismatch {
                expected: n_classes,
                found: artifact.model.n_classes,
            });
        }
        self.artifact = Some(artifact);
        self.history = None;
        let score = self.accuracy(EvalSplit::Test)?;
        self.held_accuracy = Some(score);
        info!("Loaded {} (accuracy {:.2}%)", path.display(), score * 100.0);
        Ok(score)
    }

    fn require_model(&self) -> Result<&ModelArtifact, TrainError> {
        self.artifact.as_ref().ok_or(TrainError::NotFitted)
    }

    fn split(&self, split: EvalSplit) -> (&FeatureTable, &EncodedLabels) {
        match split {
            EvalSplit::Train => (&self.partitions.x_train, &self.partitions.y_train),
            EvalSplit::Test => (&self.partitions.x_test, &self.partitions.y_test),
        }
    }
}

fn dataset(features: &FeatureTable, labels: &EncodedLabels) -> TrainDataset {
    TrainDataset {
        x: features.dense_rows(),
        y: labels.codes.clone(),
        n_classes: labels.n_classes,
    }
}
